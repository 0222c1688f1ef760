//! Room actor: an isolated Tokio task that owns one [`GameRoom`].
//!
//! The actor is the room's mutual-exclusion scope. Commands from
//! connections and events from the room's countdown are taken one at a
//! time from a single `select!` loop, so every transition sees the
//! effects of the one before it. When an accusation and the countdown's
//! expiry arrive together, whichever the loop takes first resolves the
//! round and the other finds the room already `Finished`.

use std::ops::ControlFlow;
use std::time::Duration;

use invigil_protocol::{ConnectionId, RoomCode, RoundOutcome};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::{Departure, GameRoom, RoomError, RoomInfo};

/// Commands sent to a room actor through its channel.
enum RoomCommand {
    Join {
        name: String,
        connection: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SetReady {
        name: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        requester: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Accuse {
        guesser: String,
        target: String,
        reply: oneshot::Sender<Result<Option<RoundOutcome>, RoomError>>,
    },
    Leave {
        name: String,
        reply: oneshot::Sender<Option<Departure>>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    /// Stops the actor if the room has been idle for `max_idle`.
    CloseIfIdle {
        max_idle: Duration,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The [`RoomRegistry`](crate::RoomRegistry) holds one
/// per live room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats `name` on `connection`.
    pub async fn join(&self, name: &str, connection: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            name: name.to_string(),
            connection,
            reply,
        })
        .await?
    }

    /// Marks `name` ready.
    pub async fn set_ready(&self, name: &str) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SetReady {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    /// Starts the round on behalf of `requester`.
    pub async fn start_game(&self, requester: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await?
    }

    /// Accuses `target`. `Ok(None)` means the round was not in progress.
    pub async fn accuse(
        &self,
        guesser: &str,
        target: &str,
    ) -> Result<Option<RoundOutcome>, RoomError> {
        self.request(|reply| RoomCommand::Accuse {
            guesser: guesser.to_string(),
            target: target.to_string(),
            reply,
        })
        .await?
    }

    /// Removes `name` from the room.
    pub async fn leave(&self, name: &str) -> Result<Option<Departure>, RoomError> {
        self.request(|reply| RoomCommand::Leave {
            name: name.to_string(),
            reply,
        })
        .await
    }

    /// Requests a metadata snapshot.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Closes the room if it is idle. Decided inside the actor, so a
    /// round that starts in the meantime keeps the room alive.
    pub async fn close_if_idle(&self, max_idle: Duration) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::CloseIfIdle { max_idle, reply })
            .await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the actor's answer.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: GameRoom,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let code = self.room.code().clone();
        info!(room_code = %code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle(cmd).is_break() {
                        break;
                    }
                }
                event = self.room.next_countdown_event() => {
                    self.room.on_countdown(event);
                }
            }
        }

        self.room.close();
        info!(room_code = %code, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                name,
                connection,
                reply,
            } => {
                let _ = reply.send(self.room.join(&name, connection));
            }
            RoomCommand::SetReady { name, reply } => {
                let _ = reply.send(self.room.set_ready(&name));
            }
            RoomCommand::Start { requester, reply } => {
                let _ = reply.send(self.room.start_game(requester));
            }
            RoomCommand::Accuse {
                guesser,
                target,
                reply,
            } => {
                let _ = reply.send(self.room.accuse(&guesser, &target));
            }
            RoomCommand::Leave { name, reply } => {
                let _ = reply.send(self.room.leave(&name));
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.room.info());
            }
            RoomCommand::CloseIfIdle { max_idle, reply } => {
                let idle = self.room.is_idle(max_idle);
                let _ = reply.send(idle);
                if idle {
                    self.room.close_idle();
                    return ControlFlow::Break(());
                }
            }
            RoomCommand::Shutdown => {
                info!(room_code = %self.room.code(), "room shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Spawns an actor task for `room` and returns its handle.
///
/// The actor stops on [`RoomHandle::shutdown`] or once every handle has
/// been dropped.
pub fn spawn_room(room: GameRoom, channel_size: usize) -> RoomHandle {
    let (sender, receiver) = mpsc::channel(channel_size);
    let handle = RoomHandle {
        code: room.code().clone(),
        sender,
    };
    tokio::spawn(RoomActor { room, receiver }.run());
    handle
}
