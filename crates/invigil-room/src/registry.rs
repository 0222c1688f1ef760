//! Room registry: mints room codes and tracks live rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use invigil_protocol::RoomCode;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::room::spawn_room;
use crate::{Departure, GameRoom, Notifier, ResultSink, RoomConfig, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// How many fresh codes are tried before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Creates, finds, and removes rooms.
///
/// The map lock is held only for lookups and inserts, never while a room
/// processes a command, so rooms never wait on each other.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, RoomHandle>>,
    config: RoomConfig,
    notifier: Arc<dyn Notifier>,
    results: Arc<dyn ResultSink>,
}

impl RoomRegistry {
    /// Creates an empty registry. Every room it creates uses `config`
    /// and reports through `notifier` and `results`.
    pub fn new(
        config: RoomConfig,
        notifier: Arc<dyn Notifier>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config: config.validated(),
            notifier,
            results,
        }
    }

    /// Creates an empty lobby under a fresh code.
    pub async fn create_room(&self) -> Result<RoomCode, RoomError> {
        let mut rooms = self.rooms.write().await;
        let code = unused_code(&mut rand::rng(), |code| rooms.contains_key(code))
            .ok_or(RoomError::RegistryExhausted)?;

        let room = GameRoom::new(
            code.clone(),
            self.config,
            self.notifier.clone(),
            self.results.clone(),
        );
        rooms.insert(code.clone(), spawn_room(room, DEFAULT_CHANNEL_SIZE));
        info!(room_code = %code, rooms = rooms.len(), "room created");
        Ok(code)
    }

    /// Looks up a live room.
    pub async fn get_room(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Removes a room and stops its actor. Returns `false` if the code
    /// was not live. Idempotent.
    pub async fn remove_room(&self, code: &RoomCode) -> bool {
        let handle = self.rooms.write().await.remove(code);
        match handle {
            Some(handle) => {
                let _ = handle.shutdown().await;
                info!(room_code = %code, "room removed");
                true
            }
            None => false,
        }
    }

    /// Removes `name` from the room, and the room itself when its host
    /// is the one leaving.
    pub async fn leave(
        &self,
        code: &RoomCode,
        name: &str,
    ) -> Result<Option<Departure>, RoomError> {
        let handle = self.get_room(code).await?;
        let departure = handle.leave(name).await?;
        if departure.as_ref().is_some_and(|d| d.was_host) {
            self.remove_room(code).await;
        }
        Ok(departure)
    }

    /// Removes every room idle for at least `max_idle`, and any room
    /// whose actor no longer answers. A room with a countdown running is
    /// never idle. Returns the removed codes.
    pub async fn sweep_idle(&self, max_idle: Duration) -> Vec<RoomCode> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut stale = Vec::new();
        for handle in handles {
            match handle.close_if_idle(max_idle).await {
                Ok(false) => {}
                Ok(true) => {
                    debug!(room_code = %handle.code(), "idle room closed");
                    stale.push(handle.code().clone());
                }
                Err(_) => stale.push(handle.code().clone()),
            }
        }

        if !stale.is_empty() {
            let mut rooms = self.rooms.write().await;
            for code in &stale {
                rooms.remove(code);
                info!(room_code = %code, "room removed");
            }
        }
        stale
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Codes of all live rooms, sorted.
    pub async fn room_codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<RoomCode> = self.rooms.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }
}

/// Draws one random code.
fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..RoomCode::LEN)
        .map(|_| RoomCode::ALPHABET[rng.random_range(0..RoomCode::ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}

/// Draws codes until one is not taken, up to [`MAX_CODE_ATTEMPTS`] times.
fn unused_code<R: Rng + ?Sized>(
    rng: &mut R,
    is_taken: impl Fn(&RoomCode) -> bool,
) -> Option<RoomCode> {
    (0..MAX_CODE_ATTEMPTS)
        .map(|_| generate_code(rng))
        .find(|code| !is_taken(code))
}
