//! Pooled RPC client
//!
//! Each client owns a small tokio runtime that drives its sockets, and
//! exposes a blocking [`RpcClient::call`] to the synchronous service
//! traits. Connections to one server are kept in an r2d2 pool. A
//! connection that fails mid-call is marked broken and discarded by the
//! pool instead of being handed out again.

use super::protocol::{read_message, write_message, RpcError, RpcRequest, RpcResponse, TransportError};
use crate::api::{ServiceError, ServiceResult};
use r2d2::{ManageConnection, Pool};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, warn};
use uuid::Uuid;

/// How a client reaches its server
#[derive(Debug, Clone)]
pub struct DialOptions {
    /// Limit on establishing a connection, and on the initial dial
    pub connect_timeout: Duration,
    /// Limit on waiting for a response
    pub request_timeout: Option<Duration>,
    /// Pool size per server
    pub max_connections: u32,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Some(Duration::from_secs(30)),
            max_connections: 8,
        }
    }
}

/// One TCP connection speaking the line protocol
pub struct RpcConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    request_timeout: Option<Duration>,
    broken: bool,
}

impl RpcConnection {
    pub async fn connect(addr: &str, options: &DialOptions) -> Result<Self, TransportError> {
        let stream = tokio::time::timeout(options.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout(options.connect_timeout))??;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            request_timeout: options.request_timeout,
            broken: false,
        })
    }

    /// Send one request and wait for its response
    ///
    /// Any transport failure leaves the stream in an unknown state, so the
    /// connection is marked broken.
    pub async fn call(
        &mut self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Result<serde_json::Value, RpcError>, TransportError> {
        let request = RpcRequest {
            id: Uuid::new_v4().to_string(),
            method: method.to_string(),
            params,
        };

        let outcome = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(&request))
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => self.round_trip(&request).await,
        };

        match outcome {
            Ok(response) => Ok(response.result),
            Err(e) => {
                self.broken = true;
                Err(e)
            }
        }
    }

    async fn round_trip(&mut self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        write_message(&mut self.writer, request).await?;
        let response: RpcResponse = read_message(&mut self.reader)
            .await?
            .ok_or(TransportError::Closed)?;

        if response.id != request.id {
            return Err(TransportError::IdMismatch {
                expected: request.id.clone(),
                got: response.id,
            });
        }

        Ok(response)
    }
}

/// r2d2 adapter creating [`RpcConnection`]s to one address
pub struct RpcConnectionManager {
    addr: String,
    options: DialOptions,
    runtime: Handle,
}

impl RpcConnectionManager {
    pub fn new(addr: impl Into<String>, options: DialOptions, runtime: Handle) -> Self {
        Self {
            addr: addr.into(),
            options,
            runtime,
        }
    }
}

impl ManageConnection for RpcConnectionManager {
    type Connection = RpcConnection;
    type Error = TransportError;

    fn connect(&self) -> Result<RpcConnection, TransportError> {
        self.runtime
            .block_on(RpcConnection::connect(&self.addr, &self.options))
    }

    fn is_valid(&self, conn: &mut RpcConnection) -> Result<(), TransportError> {
        if conn.broken {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn has_broken(&self, conn: &mut RpcConnection) -> bool {
        conn.broken
    }
}

/// Client for one server address
///
/// Must not be called from inside an async task; use it from plain threads
/// or `spawn_blocking`.
pub struct RpcClient {
    addr: String,
    // Declared before the runtime so pooled sockets close while it still runs
    pool: Pool<RpcConnectionManager>,
    runtime: Arc<Runtime>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").field("addr", &self.addr).finish()
    }
}

impl RpcClient {
    /// Connect to `addr`, failing if no connection can be made within the
    /// connect timeout
    pub fn dial(addr: &str, options: &DialOptions) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rpc-client")
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;
        let runtime = Arc::new(runtime);

        let manager = RpcConnectionManager::new(addr, options.clone(), runtime.handle().clone());
        let pool = Pool::builder()
            .max_size(options.max_connections.max(1))
            .min_idle(Some(1))
            .connection_timeout(options.connect_timeout)
            .build(manager)?;

        debug!(addr, "dialed RPC server");
        Ok(Self {
            addr: addr.to_string(),
            pool,
            runtime,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Call `method` and decode its result. No retries.
    pub fn call<P, R>(&self, method: &'static str, params: &P) -> ServiceResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(TransportError::from)?;
        let mut conn = self.pool.get().map_err(TransportError::from)?;

        let result = self
            .runtime
            .block_on(conn.call(method, params))
            .map_err(|e| {
                warn!(addr = %self.addr, method, error = %e, "RPC call failed");
                e
            })?;

        match result {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ServiceError::Transport(TransportError::Codec(e))),
            Err(remote) => {
                warn!(addr = %self.addr, method, code = remote.code, "RPC call returned error");
                Err(ServiceError::Remote(remote))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::protocol::ERR_METHOD_NOT_FOUND;
    use crate::rpc::server::{RpcHandler, RpcServer};

    struct Doubler;

    impl RpcHandler for Doubler {
        fn handle(
            &self,
            method: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, RpcError> {
            match method {
                "double" => {
                    let n = params
                        .as_i64()
                        .ok_or_else(|| RpcError::invalid_params("expected a number"))?;
                    Ok(serde_json::json!(n * 2))
                }
                "sleep" => {
                    std::thread::sleep(Duration::from_millis(500));
                    Ok(serde_json::Value::Null)
                }
                other => Err(RpcError::method_not_found(other)),
            }
        }
    }

    /// Runtime hosting the server side; keep it alive for the whole test
    fn server() -> (Runtime, String) {
        let runtime = Runtime::new().unwrap();
        let server = runtime
            .block_on(RpcServer::bind("127.0.0.1:0", Arc::new(Doubler)))
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        runtime.spawn(server.serve());
        (runtime, addr)
    }

    fn quick() -> DialOptions {
        DialOptions {
            connect_timeout: Duration::from_millis(500),
            ..Default::default()
        }
    }

    #[test]
    fn test_call_round_trip() {
        let (_server, addr) = server();
        let client = RpcClient::dial(&addr, &quick()).unwrap();

        let doubled: i64 = client.call("double", &21).unwrap();
        assert_eq!(doubled, 42);
    }

    #[test]
    fn test_remote_error_is_surfaced() {
        let (_server, addr) = server();
        let client = RpcClient::dial(&addr, &quick()).unwrap();

        let result: ServiceResult<i64> = client.call("triple", &1);
        match result {
            Err(ServiceError::Remote(e)) => assert_eq!(e.code, ERR_METHOD_NOT_FOUND),
            other => panic!("expected remote error, got {:?}", other),
        }

        // The connection survives an error response
        let doubled: i64 = client.call("double", &2).unwrap();
        assert_eq!(doubled, 4);
    }

    #[test]
    fn test_request_timeout() {
        let (_server, addr) = server();
        let options = DialOptions {
            request_timeout: Some(Duration::from_millis(50)),
            ..quick()
        };
        let client = RpcClient::dial(&addr, &options).unwrap();

        let result: ServiceResult<serde_json::Value> = client.call("sleep", &());
        assert!(matches!(
            result,
            Err(ServiceError::Transport(TransportError::Timeout(_)))
        ));

        // A fresh connection replaces the broken one
        let doubled: i64 = client.call("double", &5).unwrap();
        assert_eq!(doubled, 10);
    }

    #[test]
    fn test_dial_fails_fast_when_nothing_listens() {
        // Grab a free port and release it so nothing is listening there
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let result = RpcClient::dial(&addr.to_string(), &quick());
        assert!(result.is_err());
    }

    #[test]
    fn test_concurrent_calls_share_pool() {
        let (_server, addr) = server();
        let client = Arc::new(RpcClient::dial(&addr, &quick()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                std::thread::spawn(move || client.call::<_, i64>("double", &i).unwrap())
            })
            .collect();

        let mut results: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        results.sort();
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }
}
