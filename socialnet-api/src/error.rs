use socialnet_core::cache::CacheError;
use socialnet_core::config::ConfigError;
use socialnet_core::logging::LoggingError;
use socialnet_core::storage::StoreError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while bringing a service up
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to create data directory {}: {}", .path.display(), .source)]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to open newsfeed cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(String),
}
