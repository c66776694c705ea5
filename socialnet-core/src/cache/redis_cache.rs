//! Cache kept in a Redis server

use super::{expiry_millis, CacheError, CacheStore};
use r2d2::Pool;
use std::time::Duration;
use tracing::debug;

/// Cache shared through a Redis server
///
/// Connections are made lazily, so an unreachable server surfaces as
/// errors on individual calls rather than at construction.
pub struct RedisCache {
    url: String,
    pool: Pool<redis::Client>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").field("url", &self.url).finish()
    }
}

impl RedisCache {
    /// `url` is a `redis://` connection string
    pub fn connect(url: &str, pool_size: u32, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .min_idle(Some(0))
            .connection_timeout(timeout)
            .build_unchecked(client);
        debug!(url, "configured Redis feed cache");

        Ok(Self {
            url: url.to_string(),
            pool,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.pool.get()?;
        let value = redis::cmd("GET").arg(key).query(&mut *conn)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        // PX rejects zero
        let ttl_ms = expiry_millis(ttl)?.max(1);
        let mut conn = self.pool.get()?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query::<()>(&mut *conn)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.pool.get()?;
        redis::cmd("DEL").arg(key).query::<()>(&mut *conn)?;
        Ok(())
    }
}
