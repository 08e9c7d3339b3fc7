//! User identity projection.
//!
//! The account service owns users; Parlor only consumes this read-only
//! projection, attached to a connection at handshake and never mutated.

use serde::{Deserialize, Serialize};

/// Reduced read-only view of a user, as sent over the wire.
///
/// Field spellings (`id`, `displayName`, `avatarUrl`) are part of the wire
/// contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable, unique user id issued by the account service.
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
}
