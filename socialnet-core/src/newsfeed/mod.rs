//! Newsfeed generation
//!
//! A feed is the ordered list of post ids written by everyone a user follows:
//! followees in the order they were followed, each followee's posts in
//! stored order. [`GraphFeed`] computes it from the relational store;
//! [`CachedFeed`] puts a cache-aside layer in front of any [`FeedSource`].

mod cached;

pub use cached::{feed_cache_key, CachedFeed, DEFAULT_FEED_TTL};

use crate::api::{methods, GenerateNewsfeedResponse};
use crate::cache::{open_cache, CacheError, CacheStore};
use crate::config::Config;
use crate::metrics::{MetricsSink, FEED_GENERATED};
use crate::model::UserId;
use crate::storage::{SocialStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Anything that can produce a user's feed
pub trait FeedSource: Send + Sync {
    fn generate(&self, user_id: UserId) -> Result<GenerateNewsfeedResponse, StoreError>;
}

/// Feed computed straight from the follow graph, one bulk query per call
pub struct GraphFeed {
    store: Arc<dyn SocialStore>,
    metrics: Arc<dyn MetricsSink>,
}

impl GraphFeed {
    pub fn new(store: Arc<dyn SocialStore>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }
}

impl FeedSource for GraphFeed {
    fn generate(&self, user_id: UserId) -> Result<GenerateNewsfeedResponse, StoreError> {
        let exists = self.store.user_exists(user_id).inspect_err(|e| {
            error!(%user_id, error = %e, "newsfeed: failed to look up user");
        })?;
        if !exists {
            debug!(%user_id, "newsfeed: user not found");
            return Ok(GenerateNewsfeedResponse::user_not_found());
        }

        let post_ids = self.store.followee_post_ids(user_id).inspect_err(|e| {
            error!(%user_id, error = %e, "newsfeed: failed to read followee posts");
        })?;
        self.metrics.increment(FEED_GENERATED, methods::GENERATE_NEWSFEED);
        debug!(%user_id, posts = post_ids.len(), "newsfeed computed");

        Ok(GenerateNewsfeedResponse::ok(post_ids))
    }
}

/// Entry point of the newsfeed service
///
/// Holds either a bare [`GraphFeed`] or one wrapped in [`CachedFeed`],
/// depending on configuration.
pub struct NewsfeedGenerator {
    source: Box<dyn FeedSource>,
}

impl NewsfeedGenerator {
    pub fn new(source: Box<dyn FeedSource>) -> Self {
        Self { source }
    }

    /// Generator that always reads the store
    pub fn uncached(store: Arc<dyn SocialStore>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self::new(Box::new(GraphFeed::new(store, metrics)))
    }

    /// Generator that serves repeated requests from `cache` for `ttl`
    pub fn cached(
        store: Arc<dyn SocialStore>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let graph = GraphFeed::new(store, metrics.clone());
        Self::new(Box::new(CachedFeed::new(graph, cache, ttl, metrics)))
    }

    /// Build the generator described by the `[cache]` config section
    ///
    /// Fails only when the configured cache backend cannot be opened.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn SocialStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, CacheError> {
        let cache_config = &config.cache;
        if !cache_config.enabled {
            info!("newsfeed cache disabled");
            return Ok(Self::uncached(store, metrics));
        }

        let cache = open_cache(cache_config, &config.store).inspect_err(|e| {
            error!(backend = %cache_config.backend, error = %e, "failed to open newsfeed cache");
        })?;
        Ok(Self::cached(store, cache, cache_config.ttl, metrics))
    }

    pub fn generate_newsfeed(
        &self,
        user_id: UserId,
    ) -> Result<GenerateNewsfeedResponse, StoreError> {
        self.source.generate(user_id)
    }
}
