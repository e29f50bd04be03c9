//! Size-bounded cache whose entries go stale after a fixed freshness window.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    refreshed_at: Instant,
}

/// LRU map with a per-entry freshness window.
///
/// Stale entries are dropped on lookup; the least recently used entry is
/// evicted once `capacity` is reached. The lock is only held for map access.
pub struct TtlCache<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cached value if it was refreshed less than `ttl` ago.
    pub async fn get_fresh(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.refreshed_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        self.insert_many([(key, value)]).await;
    }

    /// Insert several entries under one lock, all stamped with the same instant.
    pub async fn insert_many(&self, items: impl IntoIterator<Item = (K, V)>) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        for (key, value) in items {
            entries.put(
                key,
                CacheEntry {
                    value,
                    refreshed_at: now,
                },
            );
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
