//! Wiring of store, services and RPC handlers from configuration

use crate::error::StartupError;
use metrics_exporter_prometheus::PrometheusBuilder;
use socialnet_core::api::{NewsfeedService, UserAndPostService};
use socialnet_core::config::{Config, MetricsConfig, StoreConfig};
use socialnet_core::metrics::{describe_metrics, FacadeSink, MetricsSink, NoopSink};
use socialnet_core::newsfeed::NewsfeedGenerator;
use socialnet_core::rpc::{NewsfeedHandler, RpcHandler, UserAndPostHandler};
use socialnet_core::storage::{SocialStore, SqlSocialStore};
use std::sync::Arc;
use tracing::info;

/// Which backend this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    UserAndPost,
    Newsfeed,
}

impl ServiceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::UserAndPost => "user-and-post",
            ServiceKind::Newsfeed => "newsfeed",
        }
    }
}

/// Install the Prometheus exporter when enabled and return the sink
/// components should report to
pub fn install_metrics(config: &MetricsConfig) -> Result<Arc<dyn MetricsSink>, StartupError> {
    if !config.enabled {
        return Ok(Arc::new(NoopSink));
    }

    PrometheusBuilder::new()
        .with_http_listener(config.bind_address)
        .install()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;
    describe_metrics();

    info!(addr = %config.bind_address, "Prometheus exporter listening");
    Ok(Arc::new(FacadeSink))
}

/// Open the SQLite store, creating its directory if needed
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn SocialStore>, StartupError> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StartupError::DataDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let store = SqlSocialStore::open(&config.database_path, config.pool_size)?;
    info!(
        path = %config.database_path.display(),
        pool_size = config.pool_size,
        "store opened"
    );
    Ok(Arc::new(store))
}

/// Build the RPC handler for `kind` on top of `store`
pub fn build_handler(
    kind: ServiceKind,
    config: &Config,
    store: Arc<dyn SocialStore>,
    metrics: Arc<dyn MetricsSink>,
) -> Result<Arc<dyn RpcHandler>, StartupError> {
    let handler: Arc<dyn RpcHandler> = match kind {
        ServiceKind::UserAndPost => {
            let service = Arc::new(UserAndPostService::new(store));
            Arc::new(UserAndPostHandler::new(service, metrics))
        }
        ServiceKind::Newsfeed => {
            let generator = NewsfeedGenerator::from_config(config, store, metrics.clone())?;
            let service = Arc::new(NewsfeedService::new(generator));
            Arc::new(NewsfeedHandler::new(service, metrics))
        }
    };
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialnet_core::api::methods;
    use socialnet_core::model::UserId;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.store.database_path = dir.path().join("nested").join("social.db");
        config.store.pool_size = 2;
        config
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let store = open_store(&config.store).unwrap();

        assert!(config.store.database_path.exists());
        assert!(!store.user_exists(UserId(1)).unwrap());
    }

    #[test]
    fn test_disabled_metrics_use_noop_sink() {
        let sink = install_metrics(&MetricsConfig::default());
        assert!(sink.is_ok());
    }

    #[test]
    fn test_handlers_route_their_own_methods() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let store = open_store(&config.store).unwrap();
        let params = serde_json::json!({ "user_id": 1 });

        let feed = build_handler(
            ServiceKind::Newsfeed,
            &config,
            store.clone(),
            Arc::new(NoopSink),
        )
        .unwrap();
        assert!(feed.handle(methods::GENERATE_NEWSFEED, params.clone()).is_ok());
        assert!(feed.handle(methods::GET_FOLLOWER_LIST, params.clone()).is_err());

        let users =
            build_handler(ServiceKind::UserAndPost, &config, store, Arc::new(NoopSink)).unwrap();
        assert!(users.handle(methods::GET_FOLLOWER_LIST, params.clone()).is_ok());
        assert!(users.handle(methods::GENERATE_NEWSFEED, params).is_err());
    }

    #[test]
    fn test_newsfeed_replicas_share_the_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let store = open_store(&config.store).unwrap();
        let users =
            build_handler(ServiceKind::UserAndPost, &config, store.clone(), Arc::new(NoopSink))
                .unwrap();
        let first =
            build_handler(ServiceKind::Newsfeed, &config, store.clone(), Arc::new(NoopSink))
                .unwrap();
        let second =
            build_handler(ServiceKind::Newsfeed, &config, store, Arc::new(NoopSink)).unwrap();

        for name in ["reader", "writer"] {
            let created = users
                .handle(
                    methods::CREATE_USER,
                    serde_json::json!({
                        "first_name": name, "last_name": "Test", "date_of_birth": "1990-01-01",
                        "email": format!("{}@example.com", name), "username": name,
                        "password": "pw",
                    }),
                )
                .unwrap();
            assert_eq!(created["status"], "OK");
        }
        users
            .handle(methods::FOLLOW, serde_json::json!({"follower_id": 1, "followee_id": 2}))
            .unwrap();
        let post = serde_json::json!({
            "user_id": 2, "content_text": "hi", "content_image_path": null, "visible": true,
        });
        users.handle(methods::CREATE_POST, post.clone()).unwrap();

        let params = serde_json::json!({ "user_id": 1 });
        let cached = first.handle(methods::GENERATE_NEWSFEED, params.clone()).unwrap();
        assert_eq!(cached["post_ids"].as_array().unwrap().len(), 1);

        // A post written after the first feed stays invisible on the other replica too
        users.handle(methods::CREATE_POST, post).unwrap();
        assert_eq!(second.handle(methods::GENERATE_NEWSFEED, params).unwrap(), cached);
    }
}
