//! MessageRepository trait definition.
//!
//! Append-only persistence of chat messages, tagged by room. The
//! implementation lives in parlor-infra (`SqliteMessageRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use parlor_types::error::RepositoryError;
use parlor_types::message::StoredMessage;
use parlor_types::user::UserProfile;

/// Repository trait for chat message persistence.
///
/// Messages are immutable once appended; there is no update or delete.
pub trait MessageRepository: Send + Sync {
    /// Persist a message with a store-assigned monotonic id and the
    /// current UTC timestamp.
    ///
    /// `content` must already be sanitized -- the store does not escape.
    /// A failure here must propagate: a message that was not persisted is
    /// never broadcast.
    fn append(
        &self,
        room: &str,
        sender: &UserProfile,
        content: &str,
    ) -> impl std::future::Future<Output = Result<StoredMessage, RepositoryError>> + Send;

    /// The `limit` most recent messages of a room, returned in ascending
    /// timestamp order (ties broken by id).
    ///
    /// "Most recent N" is selected newest-first, then re-ordered
    /// chronologically -- the two orderings differ and clients expect the
    /// chronological one.
    fn recent(
        &self,
        room: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;
}
