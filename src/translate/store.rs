//! Key-value store with per-key TTL, shared by translation memoization and
//! the provider availability flag. Backends: in-memory LRU (`cache.rs`) and
//! SQLite (`sqlite_cache.rs`).

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),
    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Shared key-value store with TTL. Last write wins; no transactions.
pub trait CacheStore: Send + Sync {
    /// Returns `Ok(None)` for absent or expired keys.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remove every key starting with `prefix`. Returns the number removed.
    fn delete_prefix(&self, prefix: &str) -> CacheResult<usize>;

    /// Drop expired entries. Best effort; returns how many went.
    fn purge_expired(&self) -> usize;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Time source for TTL bookkeeping, injectable so tests can expire entries.
pub trait Clock: Send + Sync {
    /// Time elapsed since the Unix epoch.
    fn now(&self) -> Duration;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(start: Duration) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
