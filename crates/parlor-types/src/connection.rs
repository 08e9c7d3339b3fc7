//! Transport-level connection identifier.
//!
//! A `ConnectionId` is minted by the transport layer when a WebSocket is
//! accepted and stays opaque to everything below it. The hub only ever
//! stores and compares these ids; it never sees socket internals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// Opaque identifier for a single live transport session.
///
/// One client device holding one WebSocket gets exactly one `ConnectionId`
/// for the lifetime of that socket. Reconnecting mints a fresh id; the old
/// one is torn down separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a new connection id (UUID v7, time-sortable).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_matches_uuid() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
