//! `InvigilServer` builder and server loop.
//!
//! This is the entry point for running an Invigil server. It ties
//! together all the layers: transport → protocol → session → room.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use invigil_protocol::{Codec, JsonCodec};
use invigil_room::{ResultSink, RoomConfig, RoomRegistry};
use invigil_session::SessionManager;
use invigil_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{ConnectionHub, InvigilError, JsonlResultSink, LogResultSink, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: RoomRegistry,
    pub(crate) hub: Arc<ConnectionHub>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an Invigil server.
///
/// # Example
///
/// ```rust,no_run
/// use invigil::prelude::*;
///
/// # async fn run() -> Result<(), InvigilError> {
/// let server = InvigilServer::builder()
///     .bind("0.0.0.0:8080")
///     .results_path("var/rounds.jsonl")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct InvigilServerBuilder {
    config: ServerConfig,
    sink: Option<Arc<dyn ResultSink>>,
}

impl InvigilServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            sink: None,
        }
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-room settings.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Appends finished rounds to a JSON-lines file at `path`.
    pub fn results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.results_path = Some(path.into());
        self
    }

    /// Uses `sink` for finished rounds. Takes precedence over
    /// [`results_path`](Self::results_path).
    pub fn result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets how often idle rooms are collected and how long a room may
    /// sit without an accepted transition.
    pub fn idle_sweep(mut self, every: Duration, max_idle: Duration) -> Self {
        self.config.sweep_interval = every;
        self.config.idle_timeout = max_idle;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<InvigilServer<JsonCodec>, InvigilError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let sink: Arc<dyn ResultSink> = match (self.sink, &self.config.results_path) {
            (Some(sink), _) => sink,
            (None, Some(path)) => Arc::new(JsonlResultSink::open(path).await?),
            (None, None) => Arc::new(LogResultSink),
        };

        let hub = Arc::new(ConnectionHub::new());
        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            rooms: RoomRegistry::new(self.config.room, hub.clone(), sink),
            hub,
            codec: JsonCodec,
        });

        Ok(InvigilServer {
            transport,
            state,
            config: self.config,
        })
    }
}

impl Default for InvigilServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Invigil server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct InvigilServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    config: ServerConfig,
}

impl InvigilServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> InvigilServerBuilder {
        InvigilServerBuilder::new()
    }
}

impl<C: Codec> InvigilServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server accept loop.
    ///
    /// Starts the idle-room sweep, then accepts connections and spawns a
    /// handler task for each. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), InvigilError> {
        info!(addr = %self.config.bind_addr, "Invigil server running");

        tokio::spawn(sweep_idle_rooms(
            Arc::clone(&self.state),
            self.config.sweep_interval,
            self.config.idle_timeout,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) if e.is_per_connection() => {
                    debug!(error = %e, "connection dropped before it was seated");
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodically removes idle rooms and frees their seats.
async fn sweep_idle_rooms<C: Codec>(
    state: Arc<ServerState<C>>,
    every: Duration,
    max_idle: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let removed = state.rooms.sweep_idle(max_idle).await;
        if removed.is_empty() {
            continue;
        }
        let mut sessions = state.sessions.lock().await;
        for code in &removed {
            let released = sessions.release_room(code);
            debug!(room_code = %code, seats = released.len(), "seats released");
        }
        info!(rooms = removed.len(), "idle rooms removed");
    }
}
