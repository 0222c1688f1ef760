//! Connection seats for Invigil.
//!
//! Players have no accounts: a player is a display name typed into a
//! lobby, reached through whatever connection typed it. This crate keeps
//! the two linked:
//!
//! 1. **Display names**: the only identity check ([`DisplayName`])
//! 2. **Seats**: which room and name each connection holds
//!    ([`SessionManager`]), so a dropped connection can be turned into a
//!    `leave` for the right room
//!
//! ```text
//! Room Layer (above)  ← receives leave(code, name) for a dropped connection
//!     ↕
//! Session Layer (this crate)  ← ConnectionId → Seat { room, name }
//!     ↕
//! Protocol Layer (below)  ← ConnectionId, RoomCode
//! ```

mod error;
mod manager;
mod name;

pub use error::SessionError;
pub use manager::{Seat, SessionManager};
pub use name::DisplayName;
