use socialnet_core::api::ServiceError;
use std::process::ExitCode;
use thiserror::Error;

/// Failure of one gateway command
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The command needs a session and none was given
    #[error("unauthorized")]
    Unauthorized,

    /// The service rejected the request (unknown user, wrong password, ...)
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        GatewayError::BadRequest(message.into())
    }

    /// Process exit code reported for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            GatewayError::BadRequest(_) => ExitCode::from(2),
            GatewayError::Unauthorized => ExitCode::from(3),
            GatewayError::Service(_) | GatewayError::Encode(_) => ExitCode::FAILURE,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
