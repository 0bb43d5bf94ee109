// Page cache - explicit TTL key-value cache for rendered listing pages
//
// Entries expire by time only: writes to posts never invalidate them, so a
// cached page may be stale for up to one TTL.

use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Value,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(body: Value, ttl: Duration) -> Self {
        Self {
            body,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Bounded LRU of page bodies with a single declared TTL
pub struct PageCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    metrics: CacheMetrics,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("ttl", &self.ttl)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl PageCache {
    pub const INDEX_PREFIX: &'static str = "index_page";

    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            metrics: CacheMetrics::default(),
        }
    }

    /// Key of an index page: only the page number takes part
    pub fn index_key(page: i64) -> String {
        format!("{}:{}", Self::INDEX_PREFIX, page)
    }

    /// A zero TTL turns the cache into a pass-through
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.entries.lock().await;
        let lookup = entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.body.clone()));
        let hit = match lookup {
            Some(Some(body)) => Some(body),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        };

        if hit.is_some() {
            debug!("Page cache hit for {}", key);
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub async fn put(&self, key: &str, body: Value) {
        if !self.is_enabled() {
            return;
        }
        self.entries
            .lock()
            .await
            .put(key.to_string(), CacheEntry::new(body, self.ttl));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
