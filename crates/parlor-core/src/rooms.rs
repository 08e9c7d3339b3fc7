//! Room membership tracking.
//!
//! Rooms spring into existence on first join and vanish when their last
//! member leaves -- an absent room and an empty room are indistinguishable,
//! so emptied entries are simply dropped. Membership is ephemeral,
//! in-memory, process-lifetime state; nothing here is persisted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use parlor_types::connection::ConnectionId;

/// Tracks which connections are members of which rooms.
///
/// Keeps a reverse index (connection -> rooms) so a disconnecting
/// connection can be removed from every room it joined in one call,
/// before teardown completes and a broadcast could target a dead
/// connection.
#[derive(Debug, Default)]
pub struct RoomTracker {
    inner: Mutex<RoomsInner>,
}

#[derive(Debug, Default)]
struct RoomsInner {
    /// room name -> member connection ids.
    members: HashMap<String, HashSet<ConnectionId>>,
    /// connection id -> rooms it has joined.
    joined: HashMap<ConnectionId, HashSet<String>>,
}

impl RoomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room. Idempotent; returns false if it was
    /// already a member.
    pub fn join(&self, room: &str, conn: ConnectionId) -> bool {
        let mut inner = self.inner.lock().expect("room tracker lock poisoned");
        let added = inner.members.entry(room.to_string()).or_default().insert(conn);
        if added {
            inner.joined.entry(conn).or_default().insert(room.to_string());
        }
        added
    }

    /// Remove a connection from a room. Idempotent; returns false if it
    /// was not a member. Drops the room entry when it empties.
    pub fn leave(&self, room: &str, conn: ConnectionId) -> bool {
        let mut inner = self.inner.lock().expect("room tracker lock poisoned");
        inner.remove_membership(room, conn)
    }

    /// Current members of a room; empty for an unknown room.
    pub fn members_of(&self, room: &str) -> Vec<ConnectionId> {
        let inner = self.inner.lock().expect("room tracker lock poisoned");
        inner
            .members
            .get(room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a connection is currently a member of a room.
    pub fn is_member(&self, room: &str, conn: ConnectionId) -> bool {
        let inner = self.inner.lock().expect("room tracker lock poisoned");
        inner
            .members
            .get(room)
            .is_some_and(|set| set.contains(&conn))
    }

    /// Remove a connection from every room it belongs to, returning the
    /// rooms it was actually a member of. Called on disconnect.
    pub fn remove_connection_everywhere(&self, conn: ConnectionId) -> Vec<String> {
        let mut inner = self.inner.lock().expect("room tracker lock poisoned");

        let rooms: Vec<String> = inner
            .joined
            .get(&conn)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        for room in &rooms {
            inner.remove_membership(room, conn);
        }
        rooms
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        let inner = self.inner.lock().expect("room tracker lock poisoned");
        inner.members.len()
    }
}

impl RoomsInner {
    fn remove_membership(&mut self, room: &str, conn: ConnectionId) -> bool {
        let Some(members) = self.members.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&conn);
        if members.is_empty() {
            self.members.remove(room);
        }
        if removed {
            if let Some(rooms) = self.joined.get_mut(&conn) {
                rooms.remove(room);
                if rooms.is_empty() {
                    self.joined.remove(&conn);
                }
            }
        }
        removed
    }
}
