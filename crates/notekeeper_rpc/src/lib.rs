//! JSON RPC surface over the Notekeeper core.
//!
//! The transport resolves a [`Session`] and hands each decoded request to
//! [`RpcHandler`]; every outcome comes back as an [`RpcResponse`] envelope.

pub mod api;
pub mod handler;
pub mod protocol;

pub use api::{core_version, init_logging, open_store, ping, serve_lines, SessionRequest};
pub use handler::RpcHandler;
pub use protocol::{
    AccessTier, Method, RpcError, RpcErrorCode, RpcRequest, RpcResponse, Session,
};
