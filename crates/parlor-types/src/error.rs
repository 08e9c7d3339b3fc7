use thiserror::Error;

use crate::connection::ConnectionId;

/// Errors from token verification at connection handshake.
///
/// Any of these rejects the connection before it enters the protocol.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("account service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from connection registry operations.
///
/// These indicate internal invariant violations, not expected runtime
/// conditions: a correct caller registers a connection exactly once and
/// unregisters it exactly once. If one surfaces, the connection is
/// force-closed and the error logged.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    #[error("connection {0} is not registered")]
    NotFound(ConnectionId),
}

/// Errors from repository operations (used by trait definitions in parlor-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

/// Errors surfaced by hub session operations.
///
/// Persistence failures are fatal to the single operation only; the
/// connection remains alive. A closed connection is not an error condition
/// at all -- teardown races in-flight commands -- so late commands map to
/// benign no-ops before this type is ever constructed.
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_display() {
        assert_eq!(
            AuthError::InvalidToken.to_string(),
            "invalid or expired token"
        );
    }

    #[test]
    fn registry_error_display() {
        let id = ConnectionId::new();
        let err = RegistryError::NotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn hub_error_wraps_repository_error() {
        let err: HubError = RepositoryError::Query("disk full".to_string()).into();
        assert_eq!(err.to_string(), "query error: disk full");
    }
}
