//! Cache kept in a SQLite table
//!
//! Every newsfeed replica opening the same database file sees the same
//! entries. Expiry uses wall-clock milliseconds so that separate processes
//! agree on when an entry dies.

use super::{expiry_millis, CacheError, CacheStore};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS feed_cache (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        expires_at INTEGER NOT NULL
    );
";

/// Cache shared through a SQLite database file
pub struct SqliteCache {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCache {
    /// Open (or create) the cache table in `path`
    pub fn open(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        debug!(path = %path.display(), "opened SQLite feed cache");

        Self::new(pool)
    }

    /// Private in-memory cache, one connection
    pub fn memory() -> Result<Self, CacheError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder().max_size(1).build(manager)?;

        Self::new(pool)
    }

    fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, CacheError> {
        pool.get()?.execute_batch(CREATE_TABLE)?;
        Ok(Self { pool })
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = now_millis();
        let removed = self
            .pool
            .get()?
            .execute("DELETE FROM feed_cache WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }
}

fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(Duration::from_secs(5))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = now_millis();
        let conn = self.pool.get()?;

        let value = conn
            .query_row(
                "SELECT value FROM feed_cache WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()?;

        if value.is_none() {
            conn.execute(
                "DELETE FROM feed_cache WHERE key = ?1 AND expires_at <= ?2",
                params![key, now],
            )?;
        }

        Ok(value)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = expiry_millis(ttl)?;
        let expires_at = i64::try_from(ttl_ms)
            .ok()
            .and_then(|ms| now_millis().checked_add(ms))
            .ok_or_else(|| CacheError::Backend(format!("TTL out of range: {:?}", ttl)))?;

        self.pool.get()?.execute(
            "INSERT INTO feed_cache (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.pool
            .get()?
            .execute("DELETE FROM feed_cache WHERE key = ?1", params![key])?;
        Ok(())
    }
}
