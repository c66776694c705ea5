//! Key-value cache abstraction
//!
//! The cache is a pure optimization in front of the relational store. No
//! ordering or transactional guarantees are assumed of a backend; callers
//! treat every [`CacheError`] as a miss.
//!
//! [`MemoryCache`] lives inside one process. [`SqliteCache`] and
//! [`RedisCache`] are shared by every newsfeed replica pointed at them.

mod memory;
mod redis_cache;
mod sqlite_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use sqlite_cache::SqliteCache;

use crate::config::{CacheBackend, CacheConfig, StoreConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Failures raised by a cache backend
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cached value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cache connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite cache error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Redis cache error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key-value store with per-entry expiry
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry; expired entries read as absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, valid for `ttl`
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Time source for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// `ttl` in whole milliseconds, rejecting values no backend can represent
pub(crate) fn expiry_millis(ttl: Duration) -> Result<u64, CacheError> {
    u64::try_from(ttl.as_millis())
        .map_err(|_| CacheError::Backend(format!("TTL out of range: {:?}", ttl)))
}

/// Open the backend selected by the `[cache]` section
///
/// The SQLite backend defaults to the relational store's database file, so
/// replicas sharing a store also share cached feeds.
pub fn open_cache(
    config: &CacheConfig,
    store: &StoreConfig,
) -> Result<Arc<dyn CacheStore>, CacheError> {
    let cache: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(config.capacity)),
        CacheBackend::Sqlite => {
            let path = config.database_path.as_ref().unwrap_or(&store.database_path);
            Arc::new(SqliteCache::open(path, config.pool_size)?)
        }
        CacheBackend::Redis => Arc::new(RedisCache::connect(
            &config.redis_url,
            config.pool_size,
            config.connect_timeout,
        )?),
    };

    info!(backend = %config.backend, ttl_secs = config.ttl.as_secs(), "newsfeed cache opened");
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_millis() {
        assert_eq!(expiry_millis(Duration::from_secs(3600)).unwrap(), 3_600_000);
        assert!(matches!(
            expiry_millis(Duration::MAX),
            Err(CacheError::Backend(_))
        ));
    }

    #[test]
    fn test_sqlite_backend_defaults_to_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig {
            database_path: dir.path().join("social.db"),
            ..Default::default()
        };
        let config = CacheConfig {
            backend: CacheBackend::Sqlite,
            ..Default::default()
        };

        let first = open_cache(&config, &store).unwrap();
        let second = open_cache(&config, &store).unwrap();
        first.set("k", b"v".to_vec(), Duration::from_secs(60)).unwrap();

        assert_eq!(second.get("k").unwrap(), Some(b"v".to_vec()));
        assert!(store.database_path.exists());
    }

    #[test]
    fn test_memory_backend_is_private() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..Default::default()
        };
        let store = StoreConfig::default();

        let first = open_cache(&config, &store).unwrap();
        let second = open_cache(&config, &store).unwrap();
        first.set("k", b"v".to_vec(), Duration::from_secs(60)).unwrap();

        assert_eq!(second.get("k").unwrap(), None);
    }
}
