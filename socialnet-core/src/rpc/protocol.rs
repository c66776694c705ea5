/*
    Wire protocol - newline-delimited JSON request/response envelopes

    Every message is one JSON document terminated by '\n'. A connection
    carries any number of request/response pairs, strictly alternating:
    the client writes a request and waits for the matching response.

    Request:
    ```json
    {"id": "4f1c...", "method": "follow", "params": {"follower_id": 1, "followee_id": 2}}
    ```

    Response:
    ```json
    {"id": "4f1c...", "result": {"Ok": "OK"}}
    {"id": "4f1c...", "result": {"Err": {"code": -32601, "message": "Method not found: nope"}}}
    ```

    Domain outcomes (USER_NOT_FOUND, ALREADY_FOLLOWED, ...) travel inside
    `Ok`. `Err` is reserved for protocol and infrastructure failures.
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted message, newline included (1 MiB)
pub const MAX_MESSAGE_SIZE: u64 = 1024 * 1024;

/// Error codes for RPC errors
pub const ERR_PARSE: i32 = -32700;
pub const ERR_METHOD_NOT_FOUND: i32 = -32601;
pub const ERR_INVALID_PARAMS: i32 = -32602;
pub const ERR_INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    pub result: Result<serde_json::Value, RpcError>,
}

/// Error returned by the remote side of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: String) -> Self {
        RpcError { code, message }
    }

    pub fn parse_error(msg: &str) -> Self {
        RpcError::new(ERR_PARSE, format!("Parse error: {}", msg))
    }

    pub fn method_not_found(method: &str) -> Self {
        RpcError::new(ERR_METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(msg: &str) -> Self {
        RpcError::new(ERR_INVALID_PARAMS, format!("Invalid params: {}", msg))
    }

    pub fn internal_error(msg: &str) -> Self {
        RpcError::new(ERR_INTERNAL_ERROR, format!("Internal error: {}", msg))
    }
}

/// Failure to move a message between client and server
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Malformed message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Message exceeds the 1 MiB limit")]
    TooLarge,

    #[error("Connection closed by peer")]
    Closed,

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: String, got: String },

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Cannot start the client runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Write one message followed by a newline
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    // Compact JSON never contains a raw newline
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one raw line; `None` on a clean end of stream
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader.take(MAX_MESSAGE_SIZE).read_line(&mut line).await?;

    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') {
        return Err(if read as u64 >= MAX_MESSAGE_SIZE {
            TransportError::TooLarge
        } else {
            TransportError::Closed
        });
    }

    Ok(Some(line))
}

/// Read and decode one message; `None` on a clean end of stream
pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, TransportError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    match read_line(reader).await? {
        Some(line) => Ok(Some(serde_json::from_str(line.trim_end())?)),
        None => Ok(None),
    }
}
