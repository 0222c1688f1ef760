//! Room lifecycle for Invigil.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`GameRoom`] and the round countdown.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates and removes rooms, looks them up by code
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GameRoom`]: the lobby → round → outcome state machine
//! - [`assign_roles`]: deals the hidden roles
//! - [`Notifier`] / [`ResultSink`]: where events and finished rounds go
//! - [`Phase`], [`RoomConfig`]

mod config;
mod error;
mod game;
mod notify;
mod registry;
mod roles;
mod room;

pub use config::{Phase, RoomConfig};
pub use error::RoomError;
pub use game::{Departure, GameRoom, Player, RoomInfo};
pub use notify::{Notifier, ResultSink, SinkError};
pub use registry::RoomRegistry;
pub use roles::assign_roles;
pub use room::{RoomHandle, spawn_room};
