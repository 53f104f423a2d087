//! Query memoization.
//!
//! Results are keyed by the record store fingerprint plus the query
//! parameters, so an entry can never be served against a different snapshot.
//! The cache only saves work; a miss recomputes exactly the same value.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Hit/miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// LRU cache of query results for one query kind.
pub struct QueryCache<K, V> {
    name: &'static str,
    /// `None` when memoization is disabled
    entries: Option<Mutex<LruCache<(u64, K), Arc<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> QueryCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` results. `0` disables it.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            entries: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached result for `(fingerprint, key)` or compute and store it.
    ///
    /// The lock is not held while `compute` runs.
    pub fn get_or_compute<F>(&self, fingerprint: u64, key: &K, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        let Some(entries) = &self.entries else {
            return Arc::new(compute());
        };

        let cache_key = (fingerprint, key.clone());

        if let Ok(mut cache) = entries.lock() {
            if let Some(hit) = cache.get(&cache_key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(cache = self.name, fingerprint, "Cache hit");
                return Arc::clone(hit);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(cache = self.name, fingerprint, "Cache miss");

        let value = Arc::new(compute());
        if let Ok(mut cache) = entries.lock() {
            cache.put(cache_key, Arc::clone(&value));
        }
        value
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            if let Ok(mut cache) = entries.lock() {
                cache.clear();
            }
        }
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .as_ref()
            .and_then(|e| e.lock().ok().map(|c| c.len()))
            .unwrap_or(0);

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Cache name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V> std::fmt::Debug for QueryCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("name", &self.name)
            .field("enabled", &self.entries.is_some())
            .finish()
    }
}
