//! Connection hub: the production [`Notifier`].
//!
//! Each connection handler registers an unbounded outbound queue here.
//! Room actors push events into those queues and the handler writes
//! them to its socket, so a room never waits on a slow client.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use invigil_protocol::{ConnectionId, ServerEvent};
use invigil_room::Notifier;
use tokio::sync::mpsc;
use tracing::trace;

/// Receives the events addressed to one connection.
pub type Outbound = mpsc::UnboundedReceiver<ServerEvent>;

/// Routes server events to live connections.
#[derive(Default)]
pub struct ConnectionHub {
    senders: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the outbound queue for `conn`, replacing any previous one.
    pub fn register(&self, conn: ConnectionId) -> Outbound {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders().insert(conn, tx);
        rx
    }

    /// Closes the outbound queue for `conn`.
    pub fn unregister(&self, conn: ConnectionId) {
        self.senders().remove(&conn);
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.senders().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn senders(&self) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>> {
        // A panic while holding the lock leaves the map itself intact.
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ConnectionHub {
    fn deliver(&self, to: ConnectionId, event: ServerEvent) {
        let senders = self.senders();
        match senders.get(&to) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    trace!(conn = %to, "outbound queue closed, event dropped");
                }
            }
            None => trace!(conn = %to, "no such connection, event dropped"),
        }
    }
}
