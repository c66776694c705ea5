//! Configuration management for socialnet
//!
//! Configuration comes from a TOML file, from `SOCIALNET_<SECTION>_<KEY>`
//! environment variables, or both (environment wins). Every entry point
//! validates before returning.

use crate::logging::{LogConfig, LogLevel};
use crate::rpc::DialOptions;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{self, Display};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "SOCIALNET";

/// Longest accepted feed lifetime (30 days)
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RPC server configuration
    pub server: ServerConfig,

    /// Relational store configuration
    pub store: StoreConfig,

    /// Newsfeed cache configuration
    pub cache: CacheConfig,

    /// Gateway replica configuration
    pub gateway: GatewayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// RPC server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Maximum concurrent connections
    pub max_connections: usize,
}

/// Relational store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file; created on first start
    pub database_path: PathBuf,

    /// Connection pool size
    pub pool_size: u32,
}

/// Where cached feeds are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process LRU map, private to one replica
    Memory,
    /// Table in a SQLite file shared by all replicas
    Sqlite,
    /// Redis server shared by all replicas
    Redis,
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Sqlite => write!(f, "sqlite"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "sqlite" => Ok(CacheBackend::Sqlite),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Newsfeed cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Put the cache in front of feed generation
    pub enabled: bool,

    /// Storage for cached feeds
    pub backend: CacheBackend,

    /// Lifetime of a cached feed
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Maximum number of cached feeds (memory backend)
    pub capacity: usize,

    /// SQLite file holding the cache; the store's file when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Redis connection string
    pub redis_url: String,

    /// Connections per replica (sqlite and redis backends)
    pub pool_size: u32,

    /// How long a cache call waits for a connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

/// Gateway replica configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Replicas of the user-and-post service
    pub user_and_post_hosts: Vec<String>,

    /// Replicas of the newsfeed service
    pub newsfeed_hosts: Vec<String>,

    /// Connect timeout, also bounding the initial dial of every replica
    #[serde(with = "humantime_serde")]
    pub dial_timeout: Duration,

    /// How long to wait for a response
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Pooled connections per replica
    pub connections_per_host: u32,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter
    pub enabled: bool,

    /// Exporter bind address
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 7001)),
            max_connections: 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/socialnet.db"),
            pool_size: 8,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Sqlite,
            ttl: Duration::from_secs(3600),
            capacity: 10_000,
            database_path: None,
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            pool_size: 4,
            connect_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            user_and_post_hosts: vec!["127.0.0.1:7001".to_string()],
            newsfeed_hosts: vec!["127.0.0.1:7002".to_string()],
            dial_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            connections_per_host: 8,
        }
    }
}

impl GatewayConfig {
    pub fn dial_options(&self) -> DialOptions {
        DialOptions {
            connect_timeout: self.dial_timeout,
            request_timeout: Some(self.request_timeout),
            max_connections: self.connections_per_host,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn log_config(&self) -> Result<LogConfig, ConfigError> {
        let level: LogLevel = self
            .level
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{}", e)))?;

        Ok(LogConfig::new(level)
            .json_format(self.json_format)
            .with_timestamp(self.with_timestamp)
            .with_target(self.with_target))
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

/// Parse `key` from the lookup into `target` if it is set
fn override_from<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let name = format!("{}_{}", ENV_PREFIX, key);
    if let Some(raw) = lookup(&name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", name, e)))?;
    }
    Ok(())
}

fn override_duration(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut Duration,
) -> Result<(), ConfigError> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    if let Some(raw) = lookup(&name) {
        *target = humantime_serde::re::humantime::parse_duration(raw.trim())
            .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", name, e)))?;
    }
    Ok(())
}

fn override_hosts(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut Vec<String>,
) {
    let name = format!("{}_{}", ENV_PREFIX, key);
    if let Some(raw) = lookup(&name) {
        *target = raw
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect();
    }
}

impl Config {
    /// Defaults overridden by environment variables
    ///
    /// Variables follow the pattern `SOCIALNET_<SECTION>_<KEY>`, for example
    /// `SOCIALNET_SERVER_BIND_ADDRESS=0.0.0.0:7001`. Host lists are
    /// comma-separated; durations use humantime syntax (`30s`, `1h`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// File (or defaults when `path` is `None`), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let lookup = &lookup;

        override_from(lookup, "SERVER_BIND_ADDRESS", &mut self.server.bind_address)?;
        override_from(lookup, "SERVER_MAX_CONNECTIONS", &mut self.server.max_connections)?;

        override_from(lookup, "STORE_DATABASE_PATH", &mut self.store.database_path)?;
        override_from(lookup, "STORE_POOL_SIZE", &mut self.store.pool_size)?;

        override_from(lookup, "CACHE_ENABLED", &mut self.cache.enabled)?;
        override_duration(lookup, "CACHE_TTL", &mut self.cache.ttl)?;
        override_from(lookup, "CACHE_CAPACITY", &mut self.cache.capacity)?;
        override_from(lookup, "CACHE_BACKEND", &mut self.cache.backend)?;
        if let Some(path) = lookup(&format!("{}_CACHE_DATABASE_PATH", ENV_PREFIX)) {
            self.cache.database_path = Some(PathBuf::from(path.trim()));
        }
        override_from(lookup, "CACHE_REDIS_URL", &mut self.cache.redis_url)?;
        override_from(lookup, "CACHE_POOL_SIZE", &mut self.cache.pool_size)?;
        override_duration(lookup, "CACHE_CONNECT_TIMEOUT", &mut self.cache.connect_timeout)?;

        override_hosts(lookup, "GATEWAY_USER_AND_POST_HOSTS", &mut self.gateway.user_and_post_hosts);
        override_hosts(lookup, "GATEWAY_NEWSFEED_HOSTS", &mut self.gateway.newsfeed_hosts);
        override_duration(lookup, "GATEWAY_DIAL_TIMEOUT", &mut self.gateway.dial_timeout)?;
        override_duration(lookup, "GATEWAY_REQUEST_TIMEOUT", &mut self.gateway.request_timeout)?;
        override_from(
            lookup,
            "GATEWAY_CONNECTIONS_PER_HOST",
            &mut self.gateway.connections_per_host,
        )?;

        override_from(lookup, "LOGGING_LEVEL", &mut self.logging.level)?;
        override_from(lookup, "LOGGING_JSON_FORMAT", &mut self.logging.json_format)?;

        override_from(lookup, "METRICS_ENABLED", &mut self.metrics.enabled)?;
        override_from(lookup, "METRICS_BIND_ADDRESS", &mut self.metrics.bind_address)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_connections == 0 {
            return Err(ConfigError::ValidationFailed(
                "server.max_connections must be greater than 0".to_string(),
            ));
        }

        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "store.pool_size must be greater than 0".to_string(),
            ));
        }

        if self.cache.enabled {
            if self.cache.capacity == 0 {
                return Err(ConfigError::ValidationFailed(
                    "cache.capacity must be greater than 0".to_string(),
                ));
            }
            if self.cache.ttl.is_zero() {
                return Err(ConfigError::ValidationFailed(
                    "cache.ttl must be greater than 0".to_string(),
                ));
            }
            if self.cache.ttl > MAX_CACHE_TTL {
                return Err(ConfigError::ValidationFailed(format!(
                    "cache.ttl must be at most {}",
                    humantime_serde::re::humantime::format_duration(MAX_CACHE_TTL)
                )));
            }
            if self.cache.backend != CacheBackend::Memory && self.cache.pool_size == 0 {
                return Err(ConfigError::ValidationFailed(
                    "cache.pool_size must be greater than 0".to_string(),
                ));
            }
            if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "cache.redis_url must be set for the redis backend".to_string(),
                ));
            }
        }

        if self.gateway.user_and_post_hosts.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "gateway.user_and_post_hosts must not be empty".to_string(),
            ));
        }

        if self.gateway.newsfeed_hosts.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "gateway.newsfeed_hosts must not be empty".to_string(),
            ));
        }

        if self.gateway.connections_per_host == 0 {
            return Err(ConfigError::ValidationFailed(
                "gateway.connections_per_host must be greater than 0".to_string(),
            ));
        }

        if self.logging.level.parse::<LogLevel>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path, contents).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.gateway.newsfeed_hosts.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());

        // Capacity is irrelevant while the cache is off
        config.cache.enabled = false;
        assert!(config.validate().is_ok());

        config = Config::default();
        config.cache.ttl = Duration::from_secs(u64::MAX);
        assert!(config.validate().is_err());

        config = Config::default();
        config.cache.backend = CacheBackend::Redis;
        config.cache.redis_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_backend_selection() {
        assert_eq!(Config::default().cache.backend, CacheBackend::Sqlite);
        assert_eq!("Redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert!("memcached".parse::<CacheBackend>().is_err());

        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("SOCIALNET_CACHE_BACKEND", "redis"),
                ("SOCIALNET_CACHE_REDIS_URL", "redis://cache.internal:6379/"),
                ("SOCIALNET_CACHE_DATABASE_PATH", "/var/lib/socialnet/cache.db"),
            ]))
            .unwrap();

        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.redis_url, "redis://cache.internal:6379/");
        assert_eq!(
            config.cache.database_path,
            Some(PathBuf::from("/var/lib/socialnet/cache.db"))
        );
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.log_config().unwrap().level, LogLevel::Debug);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("SOCIALNET_SERVER_BIND_ADDRESS", "0.0.0.0:9000"),
                ("SOCIALNET_CACHE_ENABLED", "false"),
                ("SOCIALNET_CACHE_TTL", "90s"),
                ("SOCIALNET_GATEWAY_NEWSFEED_HOSTS", "10.0.0.1:7002, 10.0.0.2:7002,"),
                ("SOCIALNET_LOGGING_LEVEL", "warn"),
            ]))
            .unwrap();

        assert_eq!(config.server.bind_address, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(90));
        assert_eq!(
            config.gateway.newsfeed_hosts,
            vec!["10.0.0.1:7002".to_string(), "10.0.0.2:7002".to_string()]
        );
        assert_eq!(config.logging.level, "warn");
        // Untouched sections keep their defaults
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("SOCIALNET_STORE_POOL_SIZE", "many")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue(msg) if msg.contains("STORE_POOL_SIZE")));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("socialnet.toml");

        let mut config = Config::default();
        config.gateway.user_and_post_hosts =
            vec!["127.0.0.1:7001".to_string(), "127.0.0.1:7011".to_string()];
        config.cache.ttl = Duration::from_secs(120);
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[cache]\nenabled = false\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl, CacheConfig::default().ttl);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[cache\nenabled = ").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/socialnet.toml");
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}
