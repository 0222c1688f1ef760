//! Identity and outcome types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ConnectionId;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short, human-shareable identifier of a room (e.g. `"K7QX2M"`).
///
/// Players type codes by hand, so construction trims surrounding
/// whitespace and upper-cases: `" k7qx2m "` and `"K7QX2M"` name the same
/// room. Deserialization goes through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a generated code.
    pub const LEN: usize = 6;

    /// Characters generated codes are drawn from. `0/O` and `1/I` are
    /// left out so a code read aloud is unambiguous.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Creates a normalized room code.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A hidden identity dealt to one player for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    VC,
    Professor,
    Invigilator,
    Cheater,
    Student,
}

impl Role {
    /// The fixed six-slot multiset every round is dealt from. `Student`
    /// is the only duplicated slot.
    pub const SLOTS: [Role; 6] = [
        Role::VC,
        Role::Professor,
        Role::Invigilator,
        Role::Cheater,
        Role::Student,
        Role::Student,
    ];

    /// How many times this role appears in [`Role::SLOTS`].
    pub fn slot_count(self) -> usize {
        Self::SLOTS.iter().filter(|r| **r == self).count()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VC => "VC",
            Self::Professor => "Professor",
            Self::Invigilator => "Invigilator",
            Self::Cheater => "Cheater",
            Self::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Where an outbound event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection currently seated in the room.
    Room,
    /// Exactly one connection (role reveals, host-only signals, errors).
    Connection(ConnectionId),
}

// ---------------------------------------------------------------------------
// Round outcome
// ---------------------------------------------------------------------------

/// How a round ended.
///
/// | outcome | cause | winner |
/// |---|---|---|
/// | `Caught` | accused player was the Cheater | Invigilator |
/// | `EscapedByError` | accused player was anyone else | Cheater |
/// | `Escaped` | countdown ran out with no accusation | Cheater |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Caught,
    Escaped,
    EscapedByError,
}

impl RoundOutcome {
    /// The role credited with the win.
    pub fn winner(self) -> Role {
        match self {
            Self::Caught => Role::Invigilator,
            Self::Escaped | Self::EscapedByError => Role::Cheater,
        }
    }

    /// The `result_type` string stored in the round log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Caught => "caught",
            Self::Escaped => "escaped",
            Self::EscapedByError => "escaped_by_error",
        }
    }
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted row per finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub room_code: RoomCode,
    pub winner_role: Role,
    pub result_type: RoundOutcome,
}

impl RoundRecord {
    /// Builds the record for `outcome`; the winner follows from it.
    pub fn new(room_code: RoomCode, outcome: RoundOutcome) -> Self {
        Self {
            room_code,
            winner_role: outcome.winner(),
            result_type: outcome,
        }
    }
}
