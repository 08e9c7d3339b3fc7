//! TokenVerifier trait definition.
//!
//! Parlor never stores credentials; the account service issues opaque
//! bearer tokens and this port checks them at connection handshake.
//! Implementations live in parlor-infra.

use parlor_types::error::AuthError;
use parlor_types::user::UserProfile;

/// Verifies a bearer token and resolves the identity behind it.
///
/// Called synchronously at handshake, before the connection is accepted
/// into the protocol; callers bound it with a timeout so a stalled
/// verifier cannot hold a half-open connection indefinitely.
pub trait TokenVerifier: Send + Sync {
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthError>> + Send;
}
