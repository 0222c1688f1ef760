//! The seat table: which room and name each connection holds.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap` wrapper and is not thread-safe
//! on its own. The server keeps it behind a mutex and holds that lock
//! only for the table update, never across a room call.

use std::collections::HashMap;

use invigil_protocol::{ConnectionId, RoomCode};

use crate::SessionError;

/// A connection's place in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub room: RoomCode,
    pub name: String,
}

/// Tracks every seated connection.
///
/// ```text
/// join_game ──→ bind() ──→ [Seated] ──→ unbind()        (disconnect / leave_game)
///                              │
///                              └──→ release_room()      (host left, room swept)
/// ```
#[derive(Debug, Default)]
pub struct SessionManager {
    seats: HashMap<ConnectionId, Seat>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `conn` now sits in `room` as `name`.
    ///
    /// # Errors
    /// [`SessionError::AlreadySeated`] if the connection already holds a
    /// seat, in this room or any other.
    pub fn bind(
        &mut self,
        conn: ConnectionId,
        room: RoomCode,
        name: String,
    ) -> Result<(), SessionError> {
        if let Some(existing) = self.seats.get(&conn) {
            return Err(SessionError::AlreadySeated(conn, existing.room.clone()));
        }
        tracing::debug!(%conn, room_code = %room, player = %name, "seat bound");
        self.seats.insert(conn, Seat { room, name });
        Ok(())
    }

    /// Checks that `conn` could be seated, without seating it.
    pub fn ensure_unseated(&self, conn: ConnectionId) -> Result<(), SessionError> {
        match self.seats.get(&conn) {
            Some(seat) => Err(SessionError::AlreadySeated(conn, seat.room.clone())),
            None => Ok(()),
        }
    }

    /// Gives up the connection's seat, returning it.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<Seat> {
        let seat = self.seats.remove(&conn)?;
        tracing::debug!(%conn, room_code = %seat.room, player = %seat.name, "seat released");
        Some(seat)
    }

    /// Drops every seat in `room`, returning the affected connections.
    ///
    /// Called when the room itself is gone (host left or swept), so the
    /// remaining players can join another room.
    pub fn release_room(&mut self, room: &RoomCode) -> Vec<ConnectionId> {
        let mut released: Vec<ConnectionId> = self
            .seats
            .iter()
            .filter(|(_, seat)| &seat.room == room)
            .map(|(conn, _)| *conn)
            .collect();
        released.sort();
        for conn in &released {
            self.seats.remove(conn);
        }
        if !released.is_empty() {
            tracing::debug!(room_code = %room, seats = released.len(), "room seats released");
        }
        released
    }

    /// Looks up a connection's seat.
    pub fn seat(&self, conn: ConnectionId) -> Option<&Seat> {
        self.seats.get(&conn)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    //! Naming follows `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn code(raw: &str) -> RoomCode {
        RoomCode::new(raw)
    }

    #[test]
    fn test_bind_new_connection_is_seated() {
        let mut mgr = SessionManager::new();

        mgr.bind(conn(1), code("ROOM22"), "Asha".into()).unwrap();

        let seat = mgr.seat(conn(1)).expect("seated");
        assert_eq!(seat.room, code("ROOM22"));
        assert_eq!(seat.name, "Asha");
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_bind_seated_connection_returns_already_seated() {
        let mut mgr = SessionManager::new();
        mgr.bind(conn(1), code("ROOM22"), "Asha".into()).unwrap();

        let result = mgr.bind(conn(1), code("OTHER3"), "Asha".into());

        assert!(matches!(
            result,
            Err(SessionError::AlreadySeated(c, ref r)) if c == conn(1) && *r == code("ROOM22")
        ));
        assert!(mgr.ensure_unseated(conn(1)).is_err());
        assert!(mgr.ensure_unseated(conn(2)).is_ok());
    }

    #[test]
    fn test_unbind_returns_seat_once() {
        let mut mgr = SessionManager::new();
        mgr.bind(conn(1), code("ROOM22"), "Asha".into()).unwrap();

        let seat = mgr.unbind(conn(1));
        assert_eq!(seat.map(|s| s.name), Some("Asha".to_owned()));
        assert!(mgr.unbind(conn(1)).is_none());
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_ensure_unseated_reports_current_room() {
        let mut mgr = SessionManager::new();
        assert!(mgr.ensure_unseated(conn(9)).is_ok());
        mgr.bind(conn(9), code("ROOM22"), "Asha".into()).unwrap();
        assert!(matches!(
            mgr.ensure_unseated(conn(9)),
            Err(SessionError::AlreadySeated(c, room)) if c == conn(9) && room == code("ROOM22")
        ));
        assert_eq!(mgr.seat(conn(9)).map(|s| s.name.as_str()), Some("Asha"));
    }

    #[test]
    fn test_release_room_only_touches_that_room() {
        let mut mgr = SessionManager::new();
        mgr.bind(conn(1), code("ROOM22"), "Asha".into()).unwrap();
        mgr.bind(conn(2), code("ROOM22"), "Ravi".into()).unwrap();
        mgr.bind(conn(3), code("OTHER3"), "Meera".into()).unwrap();

        let released = mgr.release_room(&code("ROOM22"));

        assert_eq!(released, vec![conn(1), conn(2)]);
        assert!(mgr.seat(conn(1)).is_none());
        assert!(mgr.seat(conn(3)).is_some());
        // Released connections may sit down again.
        mgr.bind(conn(1), code("OTHER3"), "Asha".into()).unwrap();
    }
}
