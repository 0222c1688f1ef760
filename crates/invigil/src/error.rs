//! Unified error type for the Invigil server.

use invigil_protocol::ProtocolError;
use invigil_room::{RoomError, SinkError};
use invigil_session::SessionError;
use invigil_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum InvigilError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame that could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A seating error (bad display name, already seated).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, full, wrong phase, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The round result sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl InvigilError {
    /// `true` if the error is dropped without an `error` frame.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Room(e) if e.is_silent())
    }

    /// HTTP-style status code for the wire `error` event.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Room(e) => e.code(),
            Self::Session(SessionError::AlreadySeated(..)) => 409,
            Self::Session(_) | Self::Protocol(_) => 400,
            Self::Transport(_) | Self::Sink(_) | Self::Io(_) | Self::Config(_) => 500,
        }
    }
}
