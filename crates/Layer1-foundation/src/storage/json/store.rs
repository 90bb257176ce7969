//! JSON 파일 저장소
//!
//! 설정 레이어(글로벌/프로젝트)를 디렉토리 단위로 읽고 씁니다.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 설정 디렉토리 이름
pub const CONFIG_DIR_NAME: &str = "prism";

/// 디렉토리 하나에 묶인 JSON 파일 저장소
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// ~/.config/prism/
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(CONFIG_DIR_NAME)))
            .ok_or_else(|| Error::Config("no user config directory on this platform".into()))
    }

    /// <root>/.prism/
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(format!(".{}", CONFIG_DIR_NAME)))
    }

    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("cannot resolve working directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).is_file()
    }

    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        self.load_optional(filename)?.ok_or_else(|| {
            Error::Config(format!("{} not found", self.file_path(filename).display()))
        })
    }

    /// 파일이 없으면 `None`, 있는데 깨져 있으면 에러
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Config(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽은 반쯤 쓰인 파일을 보지 않는다
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;

        let path = self.file_path(filename);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Layer {
        default_model: String,
        ttl: u64,
    }

    fn layer(ttl: u64) -> Layer {
        Layer {
            default_model: "gpt-4o-mini".into(),
            ttl,
        }
    }

    #[test]
    fn test_project_layer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());

        store.save("prism.json", &layer(60)).unwrap();

        assert!(store.base_dir().ends_with(".prism"));
        assert!(store.exists("prism.json"));
        assert!(!store.exists("prism.json.tmp"));
        assert_eq!(store.load::<Layer>("prism.json").unwrap(), layer(60));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        store.save("prism.json", &layer(60)).unwrap();
        store.save("prism.json", &layer(5)).unwrap();

        assert_eq!(store.load::<Layer>("prism.json").unwrap().ttl, 5);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(store.load_optional::<Layer>("missing.json").unwrap().is_none());
        assert!(matches!(
            store.load::<Layer>("missing.json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prism.json"), "{ not json").unwrap();
        let store = JsonStore::new(dir.path());

        let err = store.load_optional::<Layer>("prism.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("prism.json"));
    }
}
