//! In-memory LRU store with per-key TTL.
//! Process-local; use the SQLite store when several processes must share state.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;

use super::store::{CacheResult, CacheStore, Clock, SystemClock};

const DEFAULT_CAPACITY: usize = 10_000;

struct CacheEntry {
    value: String,
    expires_at: Duration,
}

pub struct MemoryStore {
    inner: Mutex<LruCache<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if now < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
            // Expired, drop it
            cache.pop(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // Oversized TTLs saturate to "never expires".
        let expires_at = self.clock.now().checked_add(ttl).unwrap_or(Duration::MAX);
        self.inner.lock().put(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.lock().pop(key).is_some())
    }

    fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let mut cache = self.inner.lock();
        let doomed: Vec<String> = cache
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            cache.pop(key);
        }
        Ok(doomed.len())
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut cache = self.inner.lock();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
