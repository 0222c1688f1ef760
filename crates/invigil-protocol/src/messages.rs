//! Inbound player actions and outbound server events.
//!
//! Both enums are adjacently tagged so the browser sees
//! `{"event": "timer_update", "data": {"time_left": 42}}` and sends
//! `{"action": "set_ready", "data": {"room_code": "...", "username": "..."}}`.

use serde::{Deserialize, Serialize};

use crate::{Role, RoomCode, RoundOutcome};

/// What a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientAction {
    /// Open a fresh room. Answered with [`ServerEvent::RoomCreated`].
    CreateRoom,

    /// Take a seat in a room under a display name.
    JoinGame { room_code: RoomCode, username: String },

    /// Mark a seated player as ready.
    SetReady { room_code: RoomCode, username: String },

    /// Ask to deal roles and start the countdown. Only honoured for the
    /// host's connection, which is the connection the frame arrived on.
    StartGameRequest { room_code: RoomCode },

    /// Name the player believed to be the Cheater.
    MakeGuess {
        room_code: RoomCode,
        guesser: String,
        target: String,
    },

    /// Give up the seat this connection holds, same as disconnecting.
    LeaveGame,
}

/// Everything the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Reply to `create_room`.
    RoomCreated { room_code: RoomCode },

    /// Reply to a successful `join_game`, to the joiner only.
    Joined { room_code: RoomCode, username: String },

    /// Current roster.
    UpdatePlayers { players: Vec<String> },

    /// Free-text notice ("Asha has joined.").
    Message { msg: String },

    /// Lobby readiness counter.
    ReadyStatus { ready: usize, total: usize },

    /// Host only: every seated player is ready and there are enough of them.
    EnableStartButton,

    /// Private: the recipient's own role.
    RoleReveal { role: Role },

    /// Invigilator only: the names that may be accused.
    UpdatePlayerOptions { players: Vec<String> },

    /// The round has begun.
    GameStart { message: String },

    /// Countdown progress in whole seconds.
    TimerUpdate { time_left: u32 },

    /// The round is resolved.
    GameOver {
        result: String,
        outcome: RoundOutcome,
        winner: Role,
    },

    /// A rejected action, sent to the originating connection only.
    Error { code: u16, message: String },
}
