//! Result cache - best-effort get/put over a named store
//!
//! Store errors never reach the caller: a failed read is a miss and a failed
//! write returns `false`. Keys are `{prefix}:{hash}` for transformation
//! results and `{prefix}:content_fetch:{hash}` for fetched content.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::{CacheStore, StoreRegistry};
use crate::config::CacheConfig;
use crate::event::{self, EventBus};

/// Namespace tag for fetched content
pub const CONTENT_FETCH_TAG: &str = "content_fetch";

/// Cache namespace bound to a store, prefix and TTL
#[derive(Clone)]
pub struct ResultCache {
    enabled: bool,
    registry: Arc<StoreRegistry>,
    store_name: Option<String>,
    prefix: String,
    tag: Option<&'static str>,
    ttl_secs: u64,
    events: Option<Arc<EventBus>>,
}

impl ResultCache {
    /// Transformation result namespace
    pub fn for_transformations(config: &CacheConfig, registry: Arc<StoreRegistry>) -> Self {
        Self {
            enabled: config.enabled,
            registry,
            store_name: config.store.clone(),
            prefix: config.prefix.clone(),
            tag: None,
            ttl_secs: config.ttl.transformer_data,
            events: None,
        }
    }

    /// Content fetch namespace, with its own enable flag and TTL
    pub fn for_content_fetch(config: &CacheConfig, registry: Arc<StoreRegistry>) -> Self {
        Self {
            enabled: config.content_fetch_enabled(),
            registry,
            store_name: config.store.clone(),
            prefix: config.prefix.clone(),
            tag: Some(CONTENT_FETCH_TAG),
            ttl_secs: config.ttl.content_fetch,
            events: None,
        }
    }

    /// Always misses, never writes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: Arc::new(StoreRegistry::in_memory()),
            store_name: None,
            prefix: crate::config::DEFAULT_CACHE_PREFIX.to_string(),
            tag: None,
            ttl_secs: 0,
            events: None,
        }
    }

    /// Publish `cache.error` events for swallowed store failures
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Full key for a hash in this namespace
    pub fn key(&self, hash: &str) -> String {
        match self.tag {
            Some(tag) => format!("{}:{}:{}", self.prefix, tag, hash),
            None => format!("{}:{}", self.prefix, hash),
        }
    }

    fn store(&self) -> Arc<dyn CacheStore> {
        self.registry.store(self.store_name.as_deref())
    }

    /// Read raw bytes; any store failure is a miss
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }

        let store = self.store();
        match store.get(key).await {
            Ok(Some(bytes)) => {
                debug!(key, store = store.name(), "Cache hit");
                Some(bytes)
            }
            Ok(None) => {
                debug!(key, store = store.name(), "Cache miss");
                None
            }
            Err(e) => {
                self.report(store.name(), "get", key, &e.to_string()).await;
                None
            }
        }
    }

    /// Write raw bytes with the namespace TTL
    pub async fn put(&self, key: &str, value: Vec<u8>) -> bool {
        self.put_with_ttl(key, value, self.ttl_secs).await
    }

    /// Write raw bytes; any store failure returns `false`
    pub async fn put_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> bool {
        if !self.enabled {
            return false;
        }

        let store = self.store();
        match store.put(key, value, ttl_secs).await {
            Ok(written) => written,
            Err(e) => {
                self.report(store.name(), "put", key, &e.to_string()).await;
                false
            }
        }
    }

    pub async fn forget(&self, key: &str) -> bool {
        if !self.enabled {
            return false;
        }

        let store = self.store();
        match store.forget(key).await {
            Ok(removed) => removed,
            Err(e) => {
                self.report(store.name(), "forget", key, &e.to_string()).await;
                false
            }
        }
    }

    /// Read and deserialize; an undecodable entry is treated as a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> bool {
        if !self.enabled {
            return false;
        }
        match serde_json::to_vec(value) {
            Ok(bytes) => self.put(key, bytes).await,
            Err(e) => {
                warn!(key, error = %e, "Cache value is not serializable");
                false
            }
        }
    }

    async fn report(&self, store: &str, operation: &str, key: &str, message: &str) {
        warn!(store, operation, key, error = message, "Cache store error ignored");
        if let Some(ref events) = self.events {
            events
                .publish(event::cache::error(store, operation, key, message))
                .await;
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.enabled)
            .field("store", &self.store_name)
            .field("prefix", &self.prefix)
            .field("tag", &self.tag)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
