//! Request/response transport between the gateway and the services
//!
//! Newline-delimited JSON envelopes over tokio TCP. [`RpcServer`] runs a
//! task per connection and hands each request to an [`RpcHandler`] on the
//! blocking pool; [`RpcClient`] keeps a pool of connections to one server
//! behind a blocking call API.

pub mod client;
pub mod dispatch;
pub mod protocol;
pub mod remote;
pub mod server;

pub use client::{DialOptions, RpcClient};
pub use dispatch::{NewsfeedHandler, UserAndPostHandler};
pub use protocol::{RpcError, RpcRequest, RpcResponse, TransportError};
pub use remote::{RemoteNewsfeed, RemoteUserAndPost};
pub use server::{RpcHandler, RpcServer};
