//! Server-side method dispatch onto the service traits

use super::protocol::RpcError;
use super::server::RpcHandler;
use crate::api::{methods, NewsfeedApi, ServiceResult, UserAndPostApi};
use crate::metrics::{MetricsSink, Timer, RPC_FAILURES, RPC_REQUESTS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Decode params, run the call, encode the result and record metrics
fn dispatch<P, R, F>(
    metrics: &Arc<dyn MetricsSink>,
    method: &'static str,
    params: Value,
    call: F,
) -> Result<Value, RpcError>
where
    P: DeserializeOwned,
    R: Serialize,
    F: FnOnce(P) -> ServiceResult<R>,
{
    let request: P = serde_json::from_value(params).map_err(|e| {
        debug!(method, error = %e, "invalid params");
        RpcError::invalid_params(&e.to_string())
    })?;

    metrics.increment(RPC_REQUESTS, method);
    let timer = Timer::start(metrics.clone(), method);
    let result = call(request);
    timer.stop();

    match result {
        Ok(response) => {
            serde_json::to_value(response).map_err(|e| RpcError::internal_error(&e.to_string()))
        }
        Err(e) => {
            metrics.increment(RPC_FAILURES, method);
            error!(method, error = %e, "request failed");
            Err(RpcError::internal_error(&e.to_string()))
        }
    }
}

/// Serves [`UserAndPostApi`] over RPC
pub struct UserAndPostHandler {
    api: Arc<dyn UserAndPostApi>,
    metrics: Arc<dyn MetricsSink>,
}

impl UserAndPostHandler {
    pub fn new(api: Arc<dyn UserAndPostApi>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { api, metrics }
    }
}

impl RpcHandler for UserAndPostHandler {
    fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let api = &self.api;
        let m = &self.metrics;

        match method {
            methods::CREATE_USER => dispatch(m, methods::CREATE_USER, params, |r| api.create_user(r)),
            methods::EDIT_USER => dispatch(m, methods::EDIT_USER, params, |r| api.edit_user(r)),
            methods::AUTHENTICATE_USER => {
                dispatch(m, methods::AUTHENTICATE_USER, params, |r| api.authenticate_user(r))
            }
            methods::FOLLOW => dispatch(m, methods::FOLLOW, params, |r| api.follow(r)),
            methods::UNFOLLOW => dispatch(m, methods::UNFOLLOW, params, |r| api.unfollow(r)),
            methods::GET_FOLLOWER_LIST => {
                dispatch(m, methods::GET_FOLLOWER_LIST, params, |r| api.get_follower_list(r))
            }
            methods::GET_FOLLOWING_LIST => {
                dispatch(m, methods::GET_FOLLOWING_LIST, params, |r| api.get_following_list(r))
            }
            methods::CREATE_POST => dispatch(m, methods::CREATE_POST, params, |r| api.create_post(r)),
            methods::GET_POST => dispatch(m, methods::GET_POST, params, |r| api.get_post(r)),
            methods::EDIT_POST => dispatch(m, methods::EDIT_POST, params, |r| api.edit_post(r)),
            methods::DELETE_POST => dispatch(m, methods::DELETE_POST, params, |r| api.delete_post(r)),
            methods::LIKE_POST => dispatch(m, methods::LIKE_POST, params, |r| api.like_post(r)),
            methods::CREATE_POST_COMMENT => {
                dispatch(m, methods::CREATE_POST_COMMENT, params, |r| api.create_post_comment(r))
            }
            other => {
                debug!(method = other, "unknown method");
                Err(RpcError::method_not_found(other))
            }
        }
    }
}

/// Serves [`NewsfeedApi`] over RPC
pub struct NewsfeedHandler {
    api: Arc<dyn NewsfeedApi>,
    metrics: Arc<dyn MetricsSink>,
}

impl NewsfeedHandler {
    pub fn new(api: Arc<dyn NewsfeedApi>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { api, metrics }
    }
}

impl RpcHandler for NewsfeedHandler {
    fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            methods::GENERATE_NEWSFEED => {
                dispatch(&self.metrics, methods::GENERATE_NEWSFEED, params, |r| {
                    self.api.generate_newsfeed(r)
                })
            }
            other => {
                debug!(method = other, "unknown method");
                Err(RpcError::method_not_found(other))
            }
        }
    }
}
