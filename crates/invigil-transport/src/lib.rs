//! Transport layer for Invigil.
//!
//! The room core only needs two things from the network: "deliver this
//! frame to this connection" and "tell me what this connection sent".
//! [`Transport`] and [`Connection`] describe exactly that, and
//! [`ConnectionId`] is the opaque handle the rest of the workspace uses
//! to address a connection.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Largest client frame accepted. Every client action is a short JSON
/// object; anything bigger is refused before decoding.
pub const MAX_FRAME_BYTES: usize = 4 * 1024;

/// Hard ceiling on what a connection will buffer for one message.
/// Anything past it fails the read and the connection is dropped.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Opaque handle for one client connection.
///
/// Players are keyed by display name inside a room, but every message is
/// delivered by connection, and host authority is checked against the
/// host's connection, not against a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges text frames.
///
/// `send` and `recv` may be awaited concurrently from different tasks
/// (or from two branches of one `select!`): the outbound side is driven
/// by room broadcasts, the inbound side by the player.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the handle for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_round_trips_raw_value() {
        assert_eq!(ConnectionId::new(42).into_inner(), 42);
    }

    #[test]
    fn test_connection_id_keys_a_map() {
        let mut hosts = HashMap::new();
        hosts.insert(ConnectionId::new(1), "ABC234");
        hosts.insert(ConnectionId::new(2), "XYZ789");
        assert_eq!(hosts[&ConnectionId::new(1)], "ABC234");
        assert_ne!(ConnectionId::new(1), ConnectionId::new(2));
    }
}
