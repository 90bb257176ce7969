use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::provider_type::ProviderType;

/// 개별 프로바이더 설정
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProviderEntry {
    /// API 키
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// 최대 출력 토큰
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderEntry {
    pub fn new() -> Self {
        Self::default()
    }

    // 빌더
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    // effective 값들
    pub fn effective_base_url<'a>(&'a self, provider_type: &ProviderType) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| provider_type.default_base_url())
    }

    pub fn effective_max_tokens(&self, provider_type: &ProviderType) -> u32 {
        self.max_tokens
            .unwrap_or_else(|| provider_type.default_max_tokens())
    }

    /// 사용 가능 여부 (키가 필요한 프로바이더는 키가 있어야 함)
    pub fn is_usable(&self, provider_type: &ProviderType) -> bool {
        !provider_type.requires_api_key() || self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// 프로바이더별 자격 증명 / 엔드포인트
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub providers: HashMap<ProviderType, ProviderEntry>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 환경변수에서 API 키 적용
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 주어진 lookup 으로 API 키 적용 (파일 설정에 키가 없을 때만)
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider_type in ProviderType::ALL {
            let Some(var) = provider_type.api_key_env() else {
                continue;
            };
            let Some(api_key) = lookup(var).filter(|k| !k.is_empty()) else {
                continue;
            };
            let entry = self.providers.entry(provider_type).or_default();
            if entry.api_key.is_none() {
                entry.api_key = Some(api_key);
            }
        }
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// 프로바이더 추가
    pub fn add(&mut self, provider_type: ProviderType, entry: ProviderEntry) {
        self.providers.insert(provider_type, entry);
    }

    /// 프로바이더 조회
    pub fn get(&self, provider_type: &ProviderType) -> Option<&ProviderEntry> {
        self.providers.get(provider_type)
    }

    /// 사용 가능한 프로바이더
    pub fn list_usable(&self) -> impl Iterator<Item = (&ProviderType, &ProviderEntry)> {
        self.providers.iter().filter(|(t, p)| p.is_usable(t))
    }

    /// 프로바이더 존재 여부
    pub fn contains(&self, provider_type: &ProviderType) -> bool {
        self.providers.contains_key(provider_type)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: ProviderConfig) {
        for (provider_type, entry) in other.providers {
            self.providers.insert(provider_type, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = ProviderEntry::new()
            .api_key("test-key")
            .base_url("http://localhost:9999/v1")
            .max_tokens(1024);

        assert_eq!(entry.api_key, Some("test-key".to_string()));
        assert_eq!(
            entry.effective_base_url(&ProviderType::Openai),
            "http://localhost:9999/v1"
        );
        assert_eq!(entry.effective_max_tokens(&ProviderType::Openai), 1024);
    }

    #[test]
    fn test_usable() {
        assert!(ProviderEntry::new().is_usable(&ProviderType::Ollama));
        assert!(!ProviderEntry::new().is_usable(&ProviderType::Openai));
        assert!(ProviderEntry::new()
            .api_key("k")
            .is_usable(&ProviderType::Openai));
    }

    #[test]
    fn test_env_overrides_keep_file_keys() {
        let mut config = ProviderConfig::new();
        config.add(ProviderType::Anthropic, ProviderEntry::new().api_key("from-file"));

        config.apply_env_with(|var| match var {
            "ANTHROPIC_API_KEY" => Some("from-env".to_string()),
            "GROQ_API_KEY" => Some("groq-env".to_string()),
            _ => None,
        });

        assert_eq!(
            config.get(&ProviderType::Anthropic).unwrap().api_key.as_deref(),
            Some("from-file")
        );
        assert_eq!(
            config.get(&ProviderType::Groq).unwrap().api_key.as_deref(),
            Some("groq-env")
        );
        assert!(!config.contains(&ProviderType::Openai));
    }

    #[test]
    fn test_merge() {
        let mut base = ProviderConfig::new();
        base.add(ProviderType::Openai, ProviderEntry::new().api_key("a"));

        let mut overlay = ProviderConfig::new();
        overlay.add(ProviderType::Openai, ProviderEntry::new().api_key("b"));
        overlay.add(ProviderType::Ollama, ProviderEntry::new());

        base.merge(overlay);

        assert_eq!(base.len(), 2);
        assert_eq!(
            base.get(&ProviderType::Openai).unwrap().api_key.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_deserialize_map() {
        let json = r#"{"openai": {"api_key": "sk-1"}, "ollama": {"base_url": "http://gpu:11434"}}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(
            config
                .get(&ProviderType::Ollama)
                .unwrap()
                .effective_base_url(&ProviderType::Ollama),
            "http://gpu:11434"
        );
    }
}
