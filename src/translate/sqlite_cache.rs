//! Persistent store backed by SQLite.
//! Shared by every process on the host that opens the same file; survives restarts.
//! Expiry is checked on read; `purge_expired` sweeps dead rows.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::store::{CacheError, CacheResult, CacheStore, Clock, SystemClock};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> CacheResult<Self> {
        Self::open_with_clock(db_path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(db_path: &Path, clock: Arc<dyn Clock>) -> CacheResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| CacheError::Connection(format!("failed to open SQLite cache: {e}")))?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(backend)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_cache (
                cache_key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_kv_cache_expires
                ON kv_cache(expires_at_ms);",
        )
        .map_err(backend)?;

        info!(path = %db_path.display(), "SQLite cache opened");

        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    fn now_ms(&self) -> i64 {
        i64::try_from(self.clock.now().as_millis()).unwrap_or(i64::MAX)
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.now_ms();
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv_cache WHERE cache_key = ?1 AND expires_at_ms > ?2",
                params![key, now],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(backend)?;
        if value.is_some() {
            debug!(key, "SQLite cache hit");
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = self.now_ms().saturating_add(ttl_ms);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv_cache (cache_key, value, expires_at_ms)
             VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )
        .map_err(backend)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM kv_cache WHERE cache_key = ?1", params![key])
            .map_err(backend)?;
        Ok(removed > 0)
    }

    fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let conn = self.conn.lock();
        // substr comparison sidesteps LIKE wildcard escaping in keys
        conn.execute(
            "DELETE FROM kv_cache WHERE substr(cache_key, 1, length(?1)) = ?1",
            params![prefix],
        )
        .map_err(backend)
    }

    fn purge_expired(&self) -> usize {
        let now = self.now_ms();
        let conn = self.conn.lock();
        match conn.execute(
            "DELETE FROM kv_cache WHERE expires_at_ms <= ?1",
            params![now],
        ) {
            Ok(count) => {
                if count > 0 {
                    info!(removed = count, "SQLite cache cleanup");
                }
                count
            }
            Err(e) => {
                warn!(error = %e, "SQLite cache cleanup failed");
                0
            }
        }
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

fn backend(e: rusqlite::Error) -> CacheError {
    CacheError::Backend(e.to_string())
}
