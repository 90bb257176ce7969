//! Bounded in-memory map with per-entry expiry
//!
//! Backs the in-memory cache store. Not thread-safe on its own; callers wrap
//! it in a lock.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Limits for [`TtlLruCache`]
#[derive(Debug, Clone)]
pub struct LruCacheConfig {
    pub max_entries: usize,
    /// 0 = unlimited
    pub max_bytes: usize,
}

impl Default for LruCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            max_bytes: 0,
        }
    }
}

impl LruCacheConfig {
    pub fn with_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Default::default()
        }
    }

    pub fn with_memory(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            max_entries,
            max_bytes,
        }
    }

    fn fits(&self, len: usize, bytes: usize) -> bool {
        len < self.max_entries.max(1) && (self.max_bytes == 0 || bytes <= self.max_bytes)
    }
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    stamp: u64,
    bytes: usize,
    expires_at: Option<Instant>,
}

impl<V> Slot<V> {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Least-recently-used map whose entries may expire
///
/// Recency is a monotonically increasing stamp; `order` maps stamps back to
/// keys so eviction is a lookup of the smallest stamp.
#[derive(Debug)]
pub struct TtlLruCache<K, V> {
    config: LruCacheConfig,
    slots: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    clock: u64,
    bytes: usize,
}

impl<K: Eq + Hash + Clone, V> TtlLruCache<K, V> {
    pub fn new(config: LruCacheConfig) -> Self {
        Self {
            config,
            slots: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
            bytes: 0,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Live value, marked as most recently used. Expired entries are dropped.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = self.slots.get(key)?.expired(Instant::now());
        if expired {
            self.remove(key);
            return None;
        }

        let stamp = self.next_stamp();
        let slot = self.slots.get_mut(key)?;
        self.order.remove(&slot.stamp);
        self.order.insert(stamp, key.clone());
        slot.stamp = stamp;
        Some(&slot.value)
    }

    /// `ttl` of `None` keeps the entry until evicted. An entry larger than
    /// `max_bytes` on its own is not stored.
    pub fn insert(&mut self, key: K, value: V, ttl: Option<Duration>, bytes: usize) {
        self.remove(&key);
        if self.config.max_bytes > 0 && bytes > self.config.max_bytes {
            return;
        }

        if !self.config.fits(self.slots.len(), self.bytes + bytes) {
            self.cleanup_expired();
        }
        while !self.slots.is_empty() && !self.config.fits(self.slots.len(), self.bytes + bytes) {
            self.evict_oldest();
        }

        let stamp = self.next_stamp();
        self.order.insert(stamp, key.clone());
        self.bytes += bytes;
        self.slots.insert(
            key,
            Slot {
                value,
                stamp,
                bytes,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.slots.remove(key)?;
        self.order.remove(&slot.stamp);
        self.bytes -= slot.bytes;
        Some(slot.value)
    }

    pub fn cleanup_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<K> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            if let Some(slot) = self.slots.remove(&key) {
                self.bytes -= slot.bytes;
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.bytes = 0;
    }

    /// Includes expired entries not yet collected
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.bytes
    }
}
