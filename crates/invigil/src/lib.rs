//! # Invigil
//!
//! Real-time server for a hidden-role party game set in an exam hall.
//!
//! Three to six players gather in a lobby under a short room code. When
//! the host starts the round, one player is secretly the Cheater and one
//! the Invigilator. The Invigilator has until the countdown runs out to
//! accuse someone: name the Cheater and the Invigilator wins; name anyone
//! else, or let time expire, and the Cheater does.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invigil::prelude::*;
//!
//! # async fn run() -> Result<(), InvigilError> {
//! let server = InvigilServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod hub;
mod results;
mod server;

pub use config::ServerConfig;
pub use error::InvigilError;
pub use hub::{ConnectionHub, Outbound};
pub use results::{JsonlResultSink, LogResultSink};
pub use server::{InvigilServer, InvigilServerBuilder};

/// Everything needed to run a server or drive a room directly.
pub mod prelude {
    pub use crate::{
        ConnectionHub, InvigilError, InvigilServer, InvigilServerBuilder, JsonlResultSink,
        LogResultSink, ServerConfig,
    };
    pub use invigil_countdown::{CountdownConfig, CountdownEvent, CountdownTimer};
    pub use invigil_protocol::{
        ClientAction, Codec, ConnectionId, JsonCodec, Role, RoomCode, RoundOutcome, RoundRecord,
        ServerEvent,
    };
    pub use invigil_room::{
        GameRoom, Notifier, Phase, ResultSink, RoomConfig, RoomError, RoomHandle, RoomRegistry,
        SinkError, assign_roles,
    };
    pub use invigil_session::{DisplayName, SessionError, SessionManager};
}
