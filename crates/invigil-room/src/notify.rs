//! Outbound boundaries: event delivery and round persistence.
//!
//! The room never talks to sockets or files directly. It hands events
//! to a [`Notifier`] and finished rounds to a [`ResultSink`]; the server
//! crate supplies the real implementations, tests supply recorders.

use invigil_protocol::{ConnectionId, RoomCode, RoundRecord, ServerEvent};

/// Delivers server events to connections.
///
/// Delivery is fire-and-forget. A connection that has gone away simply
/// misses the event; the room's state change stands either way.
pub trait Notifier: Send + Sync + 'static {
    /// Sends `event` to one connection.
    fn deliver(&self, to: ConnectionId, event: ServerEvent);

    /// Sends `event` to every member of `room`.
    ///
    /// The default fans out through [`Notifier::deliver`] in member order.
    fn deliver_to_room(&self, _room: &RoomCode, members: &[ConnectionId], event: ServerEvent) {
        for conn in members {
            self.deliver(*conn, event.clone());
        }
    }
}

/// Errors from a [`ResultSink`].
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink's backing writer has stopped.
    #[error("result sink closed")]
    Closed,

    /// Writing the record failed.
    #[error("result sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists one record per finished round.
///
/// Failures are logged by the room and never undo the round's outcome.
pub trait ResultSink: Send + Sync + 'static {
    fn record(&self, record: &RoundRecord) -> Result<(), SinkError>;
}
