//! Cache utilities
//!
//! - `TtlLruCache`: bounded in-memory map with expiry
//! - `Fingerprint`: SHA-256 cache identity builder

mod hash;
mod lru;

pub use hash::{canonical_json, sha256_hex, Fingerprint};
pub use lru::{LruCacheConfig, TtlLruCache};
