//! Cache-aside decorator for feed sources

use super::FeedSource;
use crate::api::{methods, GenerateNewsfeedResponse, NewsfeedStatus};
use crate::cache::{CacheError, CacheStore};
use crate::metrics::{MetricsSink, FEED_CACHE_ERROR, FEED_CACHE_HIT, FEED_CACHE_MISS};
use crate::model::UserId;
use crate::storage::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Lifetime of a cached feed
pub const DEFAULT_FEED_TTL: Duration = Duration::from_secs(3600);

/// Cache key under which a user's feed is stored
pub fn feed_cache_key(user_id: UserId) -> String {
    format!("newsfeed:{}", user_id)
}

/// Serves feeds from a [`CacheStore`], falling back to the wrapped source
///
/// A hit is returned verbatim without touching the store behind `inner`.
/// Entries are never invalidated on graph or post changes; they live until
/// the TTL runs out. Cache failures are logged and treated as misses.
/// Only successful feeds are written, so a lookup for an unknown user
/// leaves the cache untouched.
pub struct CachedFeed<S> {
    inner: S,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    metrics: Arc<dyn MetricsSink>,
}

impl<S: FeedSource> CachedFeed<S> {
    pub fn new(
        inner: S,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl,
            metrics,
        }
    }

    fn lookup(&self, key: &str) -> Result<Option<GenerateNewsfeedResponse>, CacheError> {
        match self.cache.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, feed: &GenerateNewsfeedResponse) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(feed)?;
        self.cache.set(key, bytes, self.ttl)
    }
}

impl<S: FeedSource> FeedSource for CachedFeed<S> {
    fn generate(&self, user_id: UserId) -> Result<GenerateNewsfeedResponse, StoreError> {
        let key = feed_cache_key(user_id);

        match self.lookup(&key) {
            Ok(Some(feed)) => {
                self.metrics.increment(FEED_CACHE_HIT, methods::GENERATE_NEWSFEED);
                debug!(%user_id, "newsfeed cache hit");
                return Ok(feed);
            }
            Ok(None) => {
                self.metrics.increment(FEED_CACHE_MISS, methods::GENERATE_NEWSFEED);
            }
            Err(e) => {
                self.metrics.increment(FEED_CACHE_ERROR, methods::GENERATE_NEWSFEED);
                warn!(%user_id, key = %key, error = %e, "newsfeed cache read failed, recomputing");
            }
        }

        let feed = self.inner.generate(user_id)?;

        if feed.status == NewsfeedStatus::Ok {
            if let Err(e) = self.store(&key, &feed) {
                self.metrics.increment(FEED_CACHE_ERROR, methods::GENERATE_NEWSFEED);
                warn!(%user_id, key = %key, error = %e, "newsfeed cache write failed");
            }
        }

        Ok(feed)
    }
}
