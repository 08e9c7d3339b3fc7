//! Presence transitions derived from connection registry mutations.
//!
//! A user is online iff the registry holds at least one connection for
//! them. Presence is never stored separately -- the transition values here
//! are computed inside the registry's critical section, and the snapshot is
//! recomputed from registry ground truth on every call, so there is no
//! second source of truth to drift.

/// Outcome of adding a connection for a user.
///
/// Only `BecameOnline` should trigger a `UserConnected` broadcast; a second
/// device coming up is invisible to other clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectTransition {
    /// This was the user's first live connection.
    BecameOnline,
    /// The user already had at least one other live connection.
    AlreadyOnline,
}

/// Outcome of removing a connection for a user.
///
/// Only `BecameOffline` should trigger a `UserDisconnected` broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectTransition {
    /// That was the user's last live connection.
    BecameOffline,
    /// The user still has at least one other live connection.
    StillOnline,
}

impl ConnectTransition {
    /// Whether this transition flipped the user from offline to online.
    pub fn became_online(self) -> bool {
        self == ConnectTransition::BecameOnline
    }
}

impl DisconnectTransition {
    /// Whether this transition flipped the user from online to offline.
    pub fn became_offline(self) -> bool {
        self == DisconnectTransition::BecameOffline
    }
}
