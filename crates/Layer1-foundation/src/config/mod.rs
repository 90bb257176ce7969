//! Config - 통합 설정 관리
//!
//! - `prism.rs` - PrismConfig 통합 설정 (캐시, HTTP, 프로바이더)

mod prism;

pub use prism::{
    CacheConfig, CacheTtl, ContentFetchCacheConfig, HttpConfig, PrismConfig,
    DEFAULT_CACHE_PREFIX, PRISM_CONFIG_FILE,
};
