//! Bounded result cache with optional TTL and FIFO eviction.
//!
//! [`ResultCache`] maps a [`RequestKey`] to the last successful response.
//! Entries older than the configured TTL are treated as absent. When the
//! cache is full, expired entries are purged first; if that frees nothing,
//! the key inserted first is evicted, regardless of how recently it was read. Re-putting an existing key replaces its value and
//! timestamp but keeps its place in the eviction queue.
//!
//! Timestamps use [`tokio::time::Instant`], so tests can drive expiry with a
//! paused clock.

use std::sync::Mutex;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::debug;

use super::RequestKey;
use crate::telemetry;

/// Configuration for a [`ResultCache`].
///
/// ```rust
/// # use mimir::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(20)
///     .ttl(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries. Default: 50.
    pub max_entries: usize,
    /// Maximum age before an entry is treated as absent. `None` means
    /// entries live until invalidated or evicted. Default: `None`.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            ttl: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Remove the TTL; entries live until invalidated or evicted.
    pub fn no_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }
}

/// A cached value and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

type Entries<V> = IndexMap<RequestKey, CacheEntry<V>>;

/// In-memory result cache. See module docs for eviction semantics.
pub struct ResultCache<V> {
    name: &'static str,
    config: CacheConfig,
    entries: Mutex<Entries<V>>,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache. `name` labels log lines and metrics.
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            config,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a fresh value. Returns `None` when absent or expired.
    pub fn get(&self, key: &RequestKey) -> Option<V> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone());
        if fresh.is_none() {
            entries.shift_remove(key);
        }
        drop(entries);

        if fresh.is_some() {
            debug!(cache = self.name, %key, "cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => self.name).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => self.name).increment(1);
        }
        fresh
    }

    /// Store a value, replacing any previous one for `key`.
    pub fn put(&self, key: RequestKey, value: V) {
        let mut entries = self.lock();
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        if let Some(existing) = entries.get_mut(&key) {
            *existing = entry;
            return;
        }
        self.make_room(&mut entries);
        entries.insert(key, entry);
    }

    /// Merge `incoming` into the stored value for `key` and return the result.
    ///
    /// `extract` selects the list field to extend: items from `incoming` are
    /// appended after the stored items in their original order. No identity
    /// deduplication is performed. If no fresh value is stored, `incoming`
    /// becomes the stored value.
    pub fn append<T>(
        &self,
        key: RequestKey,
        mut incoming: V,
        extract: impl Fn(&mut V) -> &mut Vec<T>,
    ) -> V {
        let mut entries = self.lock();
        if entries.get(&key).is_some_and(|e| !self.is_fresh(e)) {
            entries.shift_remove(&key);
        }

        if let Some(existing) = entries.get_mut(&key) {
            let added = std::mem::take(extract(&mut incoming));
            extract(&mut existing.value).extend(added);
            existing.stored_at = Instant::now();
            return existing.value.clone();
        }

        self.make_room(&mut entries);
        entries.insert(
            key,
            CacheEntry {
                value: incoming.clone(),
                stored_at: Instant::now(),
            },
        );
        incoming
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&self, key: &RequestKey) {
        self.lock().shift_remove(key);
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.lock().clear();
        debug!(cache = self.name, "cache cleared");
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        self.config
            .ttl
            .is_none_or(|ttl| entry.stored_at.elapsed() <= ttl)
    }

    /// Purge expired entries, then evict in insertion order until a slot is free.
    fn make_room(&self, entries: &mut Entries<V>) {
        let max = self.config.max_entries.max(1);
        if entries.len() < max {
            return;
        }
        entries.retain(|_, entry| self.is_fresh(entry));
        while entries.len() >= max {
            let Some((oldest, _)) = entries.shift_remove_index(0) else {
                break;
            };
            debug!(cache = self.name, key = %oldest, "evicted oldest entry");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries<V>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
