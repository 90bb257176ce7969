//! # Prism Cache System
//!
//! Best-effort memoization for transformation results and fetched content.
//!
//! ```text
//! ResultCache (namespace: prefix, tag, ttl, enabled)
//!      │  resolves store by name per call
//!      ▼
//! StoreRegistry ── "memory" (default) ── MemoryStore (TTL + LRU)
//!               └─ other named CacheStore impls
//! ```
//!
//! Errors from a store are logged and swallowed; callers always proceed as
//! on a miss.

pub mod result;
pub mod store;
pub mod util;

pub use result::{ResultCache, CONTENT_FETCH_TAG};
pub use store::{CacheStore, MemoryStore, StoreRegistry, DEFAULT_STORE};
pub use util::{canonical_json, sha256_hex, Fingerprint, LruCacheConfig};
