//! Wire protocol for Invigil.
//!
//! This crate defines what clients and the server say to each other and
//! the value types the room core is built from:
//!
//! - **Identity** ([`RoomCode`], [`ConnectionId`]) and the hidden
//!   [`Role`] multiset a round is dealt from.
//! - **Messages** ([`ClientAction`] inbound, [`ServerEvent`] outbound,
//!   [`Recipient`] for routing).
//! - **Outcomes** ([`RoundOutcome`], [`RoundRecord`]): the one row that
//!   is persisted per finished round.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]).
//!
//! ```text
//! Transport (frames) → Protocol (ClientAction / ServerEvent) → Room core
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use invigil_transport::ConnectionId;
pub use messages::{ClientAction, ServerEvent};
pub use types::{Recipient, Role, RoomCode, RoundOutcome, RoundRecord};
