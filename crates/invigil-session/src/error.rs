//! Error types for the session layer.

use invigil_protocol::{ConnectionId, RoomCode};

/// Errors that can occur while seating connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The display name is empty or too long.
    #[error("invalid display name: {0}")]
    InvalidName(String),

    /// The connection already holds a seat; one seat per connection.
    #[error("{0} is already seated in room {1}")]
    AlreadySeated(ConnectionId, RoomCode),

    /// The connection holds no seat.
    #[error("{0} is not seated in any room")]
    NotSeated(ConnectionId),
}
