/*
    RpcServer - accepts connections and answers envelopes

    Workflow:
    The accept loop runs on the tokio runtime and spawns one task per
    connection. A connection task reads request lines, hands each request
    to the blocking pool (the handlers call synchronous stores), and writes
    the response back before reading the next line.

    Connections over the limit are dropped right after accept. A malformed
    line gets a parse error response; the connection stays open.

┌──────────────┐        ┌──────────────┐        ┌────────────────┐
│   Listener   │──────► │  Conn task   │──────► │ spawn_blocking │
│ (accept loop)│        │ read / write │ ◄──────│  handler.handle│
└──────────────┘        └──────────────┘        └────────────────┘
*/

use super::protocol::{read_line, write_message, RpcError, RpcRequest, RpcResponse, TransportError};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default cap on simultaneously served connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Maps a method call to its result
///
/// Called on the blocking pool, so implementations may block on I/O.
pub trait RpcHandler: Send + Sync + 'static {
    fn handle(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RpcError>;
}

pub struct RpcServer {
    listener: TcpListener,
    handler: Arc<dyn RpcHandler>,
    max_connections: usize,
}

impl RpcServer {
    pub async fn bind(addr: impl ToSocketAddrs, handler: Arc<dyn RpcHandler>) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            handler,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }

    /// Connections beyond `max` are closed right after accept
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped
    pub async fn serve(self) -> io::Result<()> {
        let addr = self.local_addr()?;
        let slots = Arc::new(Semaphore::new(self.max_connections));
        info!(%addr, max_connections = self.max_connections, "RPC server listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let Ok(permit) = slots.clone().try_acquire_owned() else {
                warn!(%peer, "connection limit reached, rejecting");
                continue;
            };

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = serve_connection(stream, peer, handler).await {
                    debug!(%peer, error = %e, "connection ended with error");
                }
            });
        }
    }

    /// Run [`serve`](Self::serve) as a task on the current runtime
    pub fn spawn(self) -> io::Result<(SocketAddr, JoinHandle<io::Result<()>>)> {
        let addr = self.local_addr()?;
        Ok((addr, tokio::spawn(self.serve())))
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<dyn RpcHandler>,
) -> Result<(), TransportError> {
    stream.set_nodelay(true)?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    debug!(%peer, "connection accepted");

    while let Some(line) = read_line(&mut reader).await? {
        let response = match serde_json::from_str::<RpcRequest>(line.trim_end()) {
            Ok(request) => RpcResponse {
                result: dispatch(handler.clone(), request.method, request.params).await,
                id: request.id,
            },
            Err(e) => {
                warn!(%peer, error = %e, "malformed request");
                RpcResponse {
                    id: String::new(),
                    result: Err(RpcError::parse_error(&e.to_string())),
                }
            }
        };

        write_message(&mut writer, &response).await?;
    }

    debug!(%peer, "connection closed");
    Ok(())
}

/// Run one request on the blocking pool
async fn dispatch(
    handler: Arc<dyn RpcHandler>,
    method: String,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let worker = tokio::task::spawn_blocking(move || handler.handle(&method, params));

    match worker.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "request worker failed");
            Err(RpcError::internal_error("request worker failed"))
        }
    }
}
