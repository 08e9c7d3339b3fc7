//! Connection registry: which authenticated user owns which connection.
//!
//! Bidirectional mapping between transport connection ids and user
//! identities, supporting several simultaneous connections per user
//! (multi-device). Both directions and the presence-transition decision
//! live under one mutex, so first-connection-in / last-connection-out
//! detection can never double-fire or skip when registrations race on the
//! same user.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use parlor_types::connection::ConnectionId;
use parlor_types::error::RegistryError;
use parlor_types::user::UserProfile;

use crate::presence::{ConnectTransition, DisconnectTransition};

/// Registry of live, authenticated connections.
///
/// A connection id maps to exactly one user for its entire lifetime; a
/// user maps to zero or more connection ids. The raw maps are never
/// exposed -- only the atomic operations below.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// connection id -> the profile it authenticated as.
    by_connection: HashMap<ConnectionId, UserProfile>,
    /// user id -> that user's live connection ids.
    by_user: HashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a connection with a user.
    ///
    /// Fails with `AlreadyRegistered` if the connection id is already
    /// mapped; a connection must be unregistered before its id can be
    /// reused. The returned transition says whether this registration
    /// flipped the user from offline to online, decided in the same
    /// critical section as the mutation.
    pub fn register(
        &self,
        conn: ConnectionId,
        profile: UserProfile,
    ) -> Result<ConnectTransition, RegistryError> {
        let mut inner = self.inner.lock().expect("connection registry lock poisoned");

        if inner.by_connection.contains_key(&conn) {
            return Err(RegistryError::AlreadyRegistered(conn));
        }

        let connections = inner.by_user.entry(profile.id.clone()).or_default();
        let transition = if connections.is_empty() {
            ConnectTransition::BecameOnline
        } else {
            ConnectTransition::AlreadyOnline
        };
        connections.insert(conn);
        inner.by_connection.insert(conn, profile);

        Ok(transition)
    }

    /// Remove a connection's mapping.
    ///
    /// Returns the profile it was mapped to and whether its removal took
    /// the user fully offline. Fails with `NotFound` for an unknown
    /// connection id.
    pub fn unregister(
        &self,
        conn: ConnectionId,
    ) -> Result<(UserProfile, DisconnectTransition), RegistryError> {
        let mut inner = self.inner.lock().expect("connection registry lock poisoned");

        let profile = inner
            .by_connection
            .remove(&conn)
            .ok_or(RegistryError::NotFound(conn))?;

        let transition = match inner.by_user.get_mut(&profile.id) {
            Some(connections) => {
                connections.remove(&conn);
                if connections.is_empty() {
                    inner.by_user.remove(&profile.id);
                    DisconnectTransition::BecameOffline
                } else {
                    DisconnectTransition::StillOnline
                }
            }
            // by_connection and by_user are mutated together; a missing
            // reverse entry would mean the registry itself is corrupt.
            None => DisconnectTransition::BecameOffline,
        };

        Ok((profile, transition))
    }

    /// True iff at least one connection is registered for the user.
    pub fn is_online(&self, user_id: &str) -> bool {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_user.contains_key(user_id)
    }

    /// The profile a connection authenticated as, if it is still registered.
    pub fn profile(&self, conn: ConnectionId) -> Option<UserProfile> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_connection.get(&conn).cloned()
    }

    /// All live connection ids for a user. Empty if offline.
    pub fn connections_for_user(&self, user_id: &str) -> Vec<ConnectionId> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner
            .by_user
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Presence snapshot: one profile per online user, ordered by display
    /// name then id so clients render a stable list.
    pub fn online_users(&self) -> Vec<UserProfile> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");

        let mut seen = HashSet::new();
        let mut users: Vec<UserProfile> = inner
            .by_connection
            .values()
            .filter(|profile| seen.insert(profile.id.clone()))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        users
    }

    /// Number of live connections across all users.
    pub fn connection_count(&self) -> usize {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_connection.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            display_name: name.to_string(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn first_connection_becomes_online() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();

        let transition = registry.register(conn, profile("u-1", "Ada")).unwrap();
        assert_eq!(transition, ConnectTransition::BecameOnline);
        assert!(registry.is_online("u-1"));
    }

    #[test]
    fn second_device_is_already_online() {
        let registry = ConnectionRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.register(first, profile("u-1", "Ada")).unwrap();
        let transition = registry.register(second, profile("u-1", "Ada")).unwrap();
        assert_eq!(transition, ConnectTransition::AlreadyOnline);
        assert_eq!(registry.connections_for_user("u-1").len(), 2);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();

        registry.register(conn, profile("u-1", "Ada")).unwrap();
        let err = registry.register(conn, profile("u-1", "Ada")).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(c) if c == conn));
    }

    #[test]
    fn unregister_unknown_connection_is_not_found() {
        let registry = ConnectionRegistry::new();
        let err = registry.unregister(ConnectionId::new()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn only_last_unregister_goes_offline() {
        let registry = ConnectionRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();
        registry.register(first, profile("u-1", "Ada")).unwrap();
        registry.register(second, profile("u-1", "Ada")).unwrap();

        let (_, transition) = registry.unregister(first).unwrap();
        assert_eq!(transition, DisconnectTransition::StillOnline);
        assert!(registry.is_online("u-1"));

        let (returned, transition) = registry.unregister(second).unwrap();
        assert_eq!(transition, DisconnectTransition::BecameOffline);
        assert_eq!(returned.id, "u-1");
        assert!(!registry.is_online("u-1"));
    }

    #[test]
    fn balanced_sequences_fire_each_transition_exactly_once() {
        // Interleave two users across several connect/disconnect rounds and
        // count transitions per user.
        let registry = ConnectionRegistry::new();
        let mut online = 0;
        let mut offline = 0;

        for _ in 0..3 {
            let a1 = ConnectionId::new();
            let a2 = ConnectionId::new();
            let b1 = ConnectionId::new();

            if registry.register(a1, profile("u-a", "A")).unwrap().became_online() {
                online += 1;
            }
            if registry.register(b1, profile("u-b", "B")).unwrap().became_online() {
                online += 1;
            }
            if registry.register(a2, profile("u-a", "A")).unwrap().became_online() {
                online += 1;
            }

            if registry.unregister(a1).unwrap().1.became_offline() {
                offline += 1;
            }
            if registry.unregister(a2).unwrap().1.became_offline() {
                offline += 1;
            }
            if registry.unregister(b1).unwrap().1.became_offline() {
                offline += 1;
            }
        }

        // Two users per round, three rounds: each came online once and went
        // offline once per round, regardless of the second device.
        assert_eq!(online, 6);
        assert_eq!(offline, 6);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn snapshot_is_deduplicated_and_ordered() {
        let registry = ConnectionRegistry::new();
        registry
            .register(ConnectionId::new(), profile("u-3", "Charlie"))
            .unwrap();
        registry
            .register(ConnectionId::new(), profile("u-1", "Ada"))
            .unwrap();
        // Ada's second device must not duplicate her snapshot entry.
        registry
            .register(ConnectionId::new(), profile("u-1", "Ada"))
            .unwrap();
        registry
            .register(ConnectionId::new(), profile("u-2", "Bea"))
            .unwrap();

        let users = registry.online_users();
        let names: Vec<&str> = users.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bea", "Charlie"]);
    }

    #[test]
    fn profile_lookup_follows_lifetime() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        registry.register(conn, profile("u-1", "Ada")).unwrap();
        assert_eq!(registry.profile(conn).unwrap().id, "u-1");

        registry.unregister(conn).unwrap();
        assert!(registry.profile(conn).is_none());
    }
}
