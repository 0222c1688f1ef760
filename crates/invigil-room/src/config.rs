//! Room configuration and the phase state machine.

use std::fmt;

use invigil_countdown::CountdownConfig;
use invigil_protocol::Role;
use tracing::warn;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Per-room settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Players required before the host may start.
    pub min_players: usize,

    /// Seats in the room. Never more than the six role slots.
    pub max_players: usize,

    /// Length and cadence of the round countdown.
    pub countdown: CountdownConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: Role::SLOTS.len(),
            countdown: CountdownConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Smallest roster a round can be dealt for: a Cheater, an
    /// Invigilator, and at least one bystander.
    pub const MIN_ROSTER: usize = 3;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called by every constructor that takes a config. Rules:
    /// - `max_players` capped to the number of role slots.
    /// - `min_players` raised to [`Self::MIN_ROSTER`] and forced ≤ `max_players`.
    pub fn validated(mut self) -> Self {
        if self.max_players > Role::SLOTS.len() {
            warn!(
                max_players = self.max_players,
                slots = Role::SLOTS.len(),
                "max_players exceeds role slots, clamping"
            );
            self.max_players = Role::SLOTS.len();
        }
        self.min_players = self.min_players.max(Self::MIN_ROSTER);
        if self.max_players < self.min_players {
            self.max_players = self.min_players;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room. Strictly forward:
///
/// ```text
/// Lobby → InProgress → Finished
/// ```
///
/// - **Lobby**: seats open, players mark themselves ready.
/// - **InProgress**: roles dealt, countdown running, one accusation allowed.
/// - **Finished**: outcome decided. Only departures are still processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lobby,
    InProgress,
    Finished,
}

impl Phase {
    /// The phase after this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Returns `true` while seats can still be taken.
    pub fn accepts_joins(self) -> bool {
        matches!(self, Self::Lobby)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
