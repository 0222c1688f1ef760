//! Per-connection handler: action routing and event delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task waits on two things at once:
//!   - inbound frames, decoded into [`ClientAction`]s and applied in order
//!   - outbound [`ServerEvent`]s queued for this connection by room actors
//!
//! When the socket closes, the connection's seat is given up exactly as
//! if the player had sent `leave_game`.

use std::sync::Arc;

use invigil_protocol::{ClientAction, Codec, ConnectionId, RoomCode, ServerEvent};
use invigil_session::{DisplayName, SessionError};
use invigil_transport::{Connection, TransportError, WebSocketConnection};
use tracing::{debug, info};

use crate::InvigilError;
use crate::server::ServerState;

/// Drop guard that gives up a connection's seat when the handler exits.
///
/// Cleanup runs even if the handler returns early with an error. Since
/// `Drop` is synchronous, the async part runs in a spawned task.
struct SeatGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SeatGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        state.hub.unregister(conn_id);
        tokio::spawn(async move {
            if let Err(e) = leave_seat(&state, conn_id).await {
                debug!(%conn_id, error = %e, "cleanup after disconnect failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), InvigilError> {
    let conn_id = conn.id();
    info!(%conn_id, peer = %conn.peer_addr(), "connection opened");

    let mut outbound = state.hub.register(conn_id);
    let _guard = SeatGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e @ TransportError::FrameTooLarge { .. }) => {
                        debug!(%conn_id, error = %e, "oversized frame dropped");
                        send_error(&conn, &state.codec, 400, &e.to_string()).await?;
                        continue;
                    }
                    Err(e) => {
                        debug!(%conn_id, error = %e, "recv error");
                        // Best effort; the peer may already be gone.
                        let _ = conn.close().await;
                        break;
                    }
                };
                handle_frame(&conn, &state, &data).await?;
            }
            Some(event) = outbound.recv() => {
                send_event(&conn, &state.codec, &event).await?;
            }
        }
    }

    // _guard drops here → seat cleanup fires.
    Ok(())
}

/// Decodes one frame and applies it, reporting failures to the sender.
async fn handle_frame<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    data: &[u8],
) -> Result<(), InvigilError> {
    let conn_id = conn.id();
    let action: ClientAction = match state.codec.decode(data) {
        Ok(action) => action,
        Err(e) => {
            debug!(%conn_id, error = %e, "failed to decode action");
            return send_error(conn, &state.codec, 400, &format!("invalid message: {e}")).await;
        }
    };

    match handle_action(conn, state, action).await {
        Ok(()) => Ok(()),
        Err(e @ InvigilError::Transport(_)) => Err(e),
        Err(e) if e.is_silent() => {
            debug!(%conn_id, error = %e, "action ignored");
            Ok(())
        }
        Err(e) => {
            debug!(%conn_id, error = %e, "action rejected");
            send_error(conn, &state.codec, e.status_code(), &e.to_string()).await
        }
    }
}

/// Applies one client action on behalf of `conn`.
async fn handle_action<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    action: ClientAction,
) -> Result<(), InvigilError> {
    let conn_id = conn.id();

    match action {
        ClientAction::CreateRoom => {
            let room_code = state.rooms.create_room().await?;
            send_event(conn, &state.codec, &ServerEvent::RoomCreated { room_code }).await?;
        }

        ClientAction::JoinGame {
            room_code,
            username,
        } => {
            let name = DisplayName::parse(&username)?;
            state.sessions.lock().await.ensure_unseated(conn_id)?;

            let room = state.rooms.get_room(&room_code).await?;
            room.join(name.as_str(), conn_id).await?;
            state
                .sessions
                .lock()
                .await
                .bind(conn_id, room_code, name.into_inner())?;
        }

        ClientAction::SetReady {
            room_code,
            username,
        } => {
            let room = state.rooms.get_room(&room_code).await?;
            room.set_ready(username.trim()).await?;
        }

        ClientAction::StartGameRequest { room_code } => {
            let room = state.rooms.get_room(&room_code).await?;
            room.start_game(conn_id).await?;
        }

        ClientAction::MakeGuess {
            room_code,
            guesser,
            target,
        } => {
            let room = state.rooms.get_room(&room_code).await?;
            room.accuse(guesser.trim(), target.trim()).await?;
        }

        ClientAction::LeaveGame => {
            if !leave_seat(state, conn_id).await? {
                return Err(SessionError::NotSeated(conn_id).into());
            }
        }
    }

    Ok(())
}

/// Gives up the seat `conn_id` holds, if any. Returns whether it held one.
///
/// When the departing player was the host, the registry has removed the
/// room, so every other seat in it is released too.
async fn leave_seat<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
) -> Result<bool, InvigilError> {
    let Some(seat) = state.sessions.lock().await.unbind(conn_id) else {
        return Ok(false);
    };

    match state.rooms.leave(&seat.room, &seat.name).await {
        Ok(Some(departure)) if departure.was_host => release_room(state, &seat.room).await,
        Ok(_) => {}
        // The room was swept or closed in the meantime; the seat is gone either way.
        Err(e) => debug!(%conn_id, room_code = %seat.room, error = %e, "room already gone"),
    }
    Ok(true)
}

async fn release_room<C: Codec>(state: &ServerState<C>, code: &RoomCode) {
    let released = state.sessions.lock().await.release_room(code);
    debug!(room_code = %code, seats = released.len(), "seats released with room");
}

/// Encodes and sends one event to the client.
async fn send_event(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    event: &ServerEvent,
) -> Result<(), InvigilError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends an `error` event to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), InvigilError> {
    send_event(
        conn,
        codec,
        &ServerEvent::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}
