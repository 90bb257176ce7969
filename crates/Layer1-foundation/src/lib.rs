//! # prism-foundation
//!
//! Foundation layer for Prism:
//! - Config: 통합 설정 (PrismConfig - 캐시, HTTP, 프로바이더)
//! - Cache: 캐시 저장소, Fingerprint, ResultCache (fail-open)
//! - Media: 미디어 및 큐 전송용 인코딩 (QueueableMedia)
//! - Content: 변환 입력과 컨텍스트
//! - Event: 관측용 이벤트 버스
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  PrismConfig (global → project → env, read-only)        │
//! │        │                                                │
//! │        ▼                                                │
//! │  ResultCache ──► StoreRegistry ──► CacheStore           │
//! │  (prefix:hash)   (name → store,    (MemoryStore, ...)   │
//! │                   default 폴백)                          │
//! │                                                         │
//! │  Content ──► QueueableContent ──► (queue / cache)       │
//! │  Media   ──► QueueableMedia (base64)                    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod media;
pub mod registry;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{BoxError, Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    CacheConfig, CacheTtl, ContentFetchCacheConfig, HttpConfig, PrismConfig,
    DEFAULT_CACHE_PREFIX, PRISM_CONFIG_FILE,
};

// ============================================================================
// Registry
// ============================================================================
pub use registry::{ProviderConfig, ProviderEntry, ProviderType};

// ============================================================================
// Storage
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Cache
// ============================================================================
pub use cache::{
    CacheStore, Fingerprint, MemoryStore, ResultCache, StoreRegistry, CONTENT_FETCH_TAG,
    DEFAULT_STORE,
};

// ============================================================================
// Content / Media
// ============================================================================
pub use content::{Content, Context, QueueableContent};
pub use media::{Media, MediaKind, QueueableMedia};

// ============================================================================
// Event
// ============================================================================
pub use event::{EventBus, EventBusConfig, EventCategory, EventSeverity, PrismEvent};
