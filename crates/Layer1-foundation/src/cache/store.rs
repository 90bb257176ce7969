//! Cache store boundary
//!
//! `CacheStore` is the pluggable key-value backend. `StoreRegistry` selects a
//! store by name and falls back to the default store when the name is unknown.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::util::{LruCacheConfig, TtlLruCache};
use crate::Result;

/// Name of the built-in in-memory store
pub const DEFAULT_STORE: &str = "memory";

/// Key-value cache backend
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name used for selection and logging
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value; `ttl_secs == 0` keeps it until evicted
    async fn put(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<bool>;

    async fn forget(&self, key: &str) -> Result<bool>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store backed by a TTL-aware LRU
pub struct MemoryStore {
    name: String,
    entries: Mutex<TtlLruCache<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_STORE, LruCacheConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: LruCacheConfig) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(TtlLruCache::new(config)),
        }
    }

    /// Number of entries, including expired ones not yet collected
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(&key.to_string()).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<bool> {
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
        let size = key.len() + value.len();
        self.entries
            .lock()
            .insert(key.to_string(), value, ttl, size);
        Ok(true)
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().remove(&key.to_string()).is_some())
    }
}

// ============================================================================
// StoreRegistry
// ============================================================================

/// Named cache stores with a default
#[derive(Clone)]
pub struct StoreRegistry {
    default: Arc<dyn CacheStore>,
    stores: HashMap<String, Arc<dyn CacheStore>>,
}

impl StoreRegistry {
    /// Registry whose default is the given store
    pub fn new(default: Arc<dyn CacheStore>) -> Self {
        let mut stores = HashMap::new();
        stores.insert(default.name().to_string(), default.clone());
        Self { default, stores }
    }

    /// Registry with a single in-memory default store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.register(store);
        self
    }

    pub fn register(&mut self, store: Arc<dyn CacheStore>) {
        self.stores.insert(store.name().to_string(), store);
    }

    pub fn default_store(&self) -> Arc<dyn CacheStore> {
        self.default.clone()
    }

    /// Strict lookup
    pub fn get(&self, name: &str) -> Option<Arc<dyn CacheStore>> {
        self.stores.get(name).cloned()
    }

    /// Resolve a store by name, falling back to the default
    pub fn store(&self, name: Option<&str>) -> Arc<dyn CacheStore> {
        match name {
            None => self.default.clone(),
            Some(name) => self.get(name).unwrap_or_else(|| {
                warn!(
                    store = name,
                    fallback = self.default.name(),
                    "Unknown cache store, using default"
                );
                self.default.clone()
            }),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.stores.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("default", &self.default.name())
            .field("stores", &self.names())
            .finish()
    }
}
