//! Connection layer for Prowl.
//!
//! The coordinator consumes a stream of `(ConnectionId, payload)` pairs
//! and a disconnect notification that fires exactly once per connection;
//! this crate provides the [`Listener`] and [`Connection`] traits that
//! produce them, plus the default WebSocket implementation.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket connections via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod ws;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use ws::{WsConnection, WsListener};

use std::fmt;

/// Opaque identifier for one network connection.
///
/// Stable for the lifetime of the connection; the coordinator uses it
/// directly as the player identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts incoming connections.
pub trait Listener: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The bound local address, for logging and port-0 tests.
    fn local_addr(&self) -> Result<std::net::SocketAddr, Self::Error>;
}

/// One bidirectional connection.
///
/// Send and receive are independent: the outbound half may be written
/// from a writer task while a reader task blocks on [`recv`](Self::recv).
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends a payload to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next payload from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// The unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
