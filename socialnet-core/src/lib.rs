//! Core of the social network backend
//!
//! Two services run as replicated processes over a shared store: the
//! user-and-post service (accounts, the follow graph, posts, likes and
//! comments) and the newsfeed service. Both speak the same line-delimited
//! JSON RPC, and the gateway reaches them through a [`replica::ReplicaSet`].
//!
//! Fixtures and test doubles live in `test_utils`, behind the `test-utils`
//! feature.

pub mod api;
pub mod cache;
pub mod config;
pub mod content;
pub mod graph;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod newsfeed;
pub mod replica;
pub mod rpc;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = api::methods::GENERATE_NEWSFEED;
        let _ = config::Config::default();
    }
}
