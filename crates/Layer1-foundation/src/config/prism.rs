//! Prism Config - 통합 설정
//!
//! 글로벌(~/.config/prism/prism.json) → 프로젝트(.prism/prism.json) → 환경변수
//! 순서로 병합한다. 로드 후에는 읽기 전용으로 취급한다.

use crate::registry::{ProviderConfig, ProviderType};
use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 설정 파일명
pub const PRISM_CONFIG_FILE: &str = "prism.json";

/// 기본 캐시 키 prefix
pub const DEFAULT_CACHE_PREFIX: &str = "prism_transformer";

// ============================================================================
// Prism Config (통합)
// ============================================================================

/// Prism 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismConfig {
    /// 기본 프로바이더
    #[serde(default = "default_provider")]
    pub default_provider: ProviderType,

    /// 기본 모델
    #[serde(default = "default_model")]
    pub default_model: String,

    /// 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP 클라이언트 설정
    #[serde(default)]
    pub http: HttpConfig,

    /// 프로바이더 자격 증명
    #[serde(default)]
    pub providers: ProviderConfig,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_model: default_model(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            providers: ProviderConfig::default(),
        }
    }
}

impl PrismConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 + 환경변수 병합 로드
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        let mut config = Self::load_from(global.as_ref(), project.as_ref())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 주어진 저장소들에서 병합 로드 (환경변수 미적용)
    ///
    /// 파일 단위가 아니라 키 단위로 병합되므로 프로젝트 파일에 `cache.ttl`
    /// 만 있어도 글로벌 파일의 `cache.store` 는 유지된다.
    pub fn load_from(global: Option<&JsonStore>, project: Option<&JsonStore>) -> Result<Self> {
        let mut merged = Value::Object(Default::default());

        for store in [global, project].into_iter().flatten() {
            if let Some(layer) = store.load_optional::<Value>(PRISM_CONFIG_FILE)? {
                merge_json(&mut merged, layer);
            }
        }

        serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid {}: {}", PRISM_CONFIG_FILE, e)))
    }

    /// 글로벌 설정 저장
    pub fn save_global(&self) -> Result<()> {
        JsonStore::global()?.save(PRISM_CONFIG_FILE, self)
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self) -> Result<()> {
        JsonStore::current_project()?.save(PRISM_CONFIG_FILE, self)
    }

    // ========================================================================
    // Env overrides
    // ========================================================================

    /// 환경변수 오버라이드
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("PRISM_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.default_provider = p,
                Err(e) => tracing::warn!("Ignoring PRISM_PROVIDER: {}", e),
            }
        }
        if let Some(model) = lookup("PRISM_MODEL").filter(|m| !m.is_empty()) {
            self.default_model = model;
        }
        if let Some(enabled) = lookup("PRISM_CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&enabled).unwrap_or(self.cache.enabled);
        }
        if let Some(store) = lookup("PRISM_CACHE_STORE").filter(|s| !s.is_empty()) {
            self.cache.store = Some(store);
        }
        if let Some(timeout) = lookup("PRISM_HTTP_TIMEOUT").and_then(|t| t.parse().ok()) {
            self.http.timeout = timeout;
        }

        self.providers.apply_env_with(&lookup);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_default_provider(mut self, provider: ProviderType) -> Self {
        self.default_provider = provider;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_providers(mut self, providers: ProviderConfig) -> Self {
        self.providers = providers;
        self
    }

    /// 캐시 비활성화
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }
}

// ============================================================================
// Cache Config
// ============================================================================

/// 캐시 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 변환 결과 캐시 활성화
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 사용할 저장소 이름 (None 이면 기본 저장소)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,

    /// 키 prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// TTL (초)
    #[serde(default)]
    pub ttl: CacheTtl,

    /// URL 가져오기 캐시
    #[serde(default)]
    pub content_fetch: ContentFetchCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: None,
            prefix: default_prefix(),
            ttl: CacheTtl::default(),
            content_fetch: ContentFetchCacheConfig::default(),
        }
    }
}

impl CacheConfig {
    /// content fetch 캐시 활성 여부 (전역 플래그와 AND)
    pub fn content_fetch_enabled(&self) -> bool {
        self.enabled && self.content_fetch.enabled
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// 캐시 종류별 TTL (초)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheTtl {
    #[serde(default = "default_transformer_ttl")]
    pub transformer_data: u64,

    #[serde(default = "default_content_fetch_ttl")]
    pub content_fetch: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            transformer_data: default_transformer_ttl(),
            content_fetch: default_content_fetch_ttl(),
        }
    }
}

/// content fetch 캐시 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFetchCacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ContentFetchCacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP 클라이언트 기본값 (초, 0 이하는 미설정)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout: i64,

    #[serde(default)]
    pub connect_timeout: i64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            connect_timeout: 0,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// JSON 객체 재귀 병합 (overlay 가 우선)
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_provider() -> ProviderType {
    ProviderType::Openai
}

fn default_model() -> String {
    ProviderType::Openai.default_model().to_string()
}

fn default_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}

fn default_transformer_ttl() -> u64 {
    3600
}

fn default_content_fetch_ttl() -> u64 {
    1800
}

fn default_http_timeout() -> i64 {
    180
}

fn default_true() -> bool {
    true
}
