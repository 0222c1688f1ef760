//! Error types for the room layer.

use invigil_protocol::RoomCode;

use crate::Phase;

/// Errors that can occur during room operations.
///
/// Every structural error leaves the room exactly as it was; the server
/// reports it to the originating connection only.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Another player in the room already uses this name.
    #[error("name {0:?} is already taken in this room")]
    DuplicateName(String),

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// No player by this name is seated.
    #[error("no player named {0:?} in this room")]
    UnknownPlayer(String),

    /// The accused name is not a seated player.
    #[error("cannot accuse {0:?}: no such player")]
    UnknownTarget(String),

    /// Only the host's connection may start the round.
    #[error("only the host can start the game")]
    NotHost,

    /// Too few players to deal roles.
    #[error("need at least {need} players to start, have {have}")]
    InsufficientPlayers { have: usize, need: usize },

    /// Too many players for the role slots.
    #[error("at most {max} players can be dealt roles, have {have}")]
    TooManyPlayers { have: usize, max: usize },

    /// The action is not accepted in the room's current phase.
    #[error("{action} is not accepted while the room is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    /// No unused room code could be generated.
    #[error("no free room code available")]
    RegistryExhausted,

    /// The room's actor has stopped (room removed mid-request).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// `true` for errors that are dropped without telling the client.
    ///
    /// A phase mismatch means the action arrived too late (a second
    /// accusation, a start after the round began); the outcome is
    /// already final, so there is nothing useful to report.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::InvalidPhase { .. })
    }

    /// HTTP-style status code carried in the wire `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::DuplicateName(_) | Self::RoomFull(_) => 409,
            Self::NotHost => 403,
            Self::RegistryExhausted | Self::Unavailable(_) => 503,
            Self::UnknownPlayer(_)
            | Self::UnknownTarget(_)
            | Self::InsufficientPlayers { .. }
            | Self::TooManyPlayers { .. }
            | Self::InvalidPhase { .. } => 400,
        }
    }
}
