//! # prism-transformer
//!
//! Prompt-driven content transformation for Prism:
//! - Transformer: 변환기 정의 (이름, 프롬프트, 옵션, 훅)
//! - Identity: 설정 기반 결정적 캐시 식별자
//! - Engine: 캐시 조회 → 프로바이더 호출 → 캐시 기록
//! - Fetch: URL 콘텐츠 가져오기 (별도 캐시 네임스페이스)
//! - Router: 인라인 실행 또는 큐 전송
//!
//! ## 아키텍처
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Prism (fluent) ──► ContentFetcher (URL → text, cached)    │
//! │        │                                                   │
//! │        ▼                                                   │
//! │  ExecutionRouter ── queued ──► TaskQueue ──► JobRunner ─┐  │
//! │        │ inline                                         │  │
//! │        ▼                                                ▼  │
//! │  TransformationEngine ◄─────────────────────────────────┘  │
//! │    cache_key ─► ResultCache ─► Invoker (prism-provider)    │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod fetch;
pub mod identity;
pub mod options;
pub mod prism;
pub mod result;
pub mod router;
pub mod transformer;

// ============================================================================
// Primary Exports
// ============================================================================

pub use engine::{
    execute_transformation, resolve_client_options, resolve_model, resolve_provider,
    TransformationEngine,
};
pub use identity::{cache_identity, cache_key};
pub use options::{Setting, TransformerOptions};
pub use result::{ResultData, TransformerMetadata, TransformerResult};
pub use transformer::{InlineTransformer, Transformer};

// ============================================================================
// Fetch / Routing
// ============================================================================

pub use fetch::{CachePolicy, ContentFetcher, DefaultCachePolicy, FetchOptions, USER_AGENT};
pub use prism::{Prism, PrismServices};
pub use router::{
    Dispatch, ExecutionRouter, HandlerFn, HandlerFuture, HandlerRegistry, TransformerHandler,
    TransformerJobRunner,
};
