//! Chat message types.
//!
//! `StoredMessage` is the persisted entity; `MessageView` is the wire
//! projection delivered in `ReceiveMessage` and `ChatHistory` events.
//! Messages are immutable once created -- there is no update or delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserProfile;

/// A persisted chat message.
///
/// The id is assigned by the store and increases monotonically; the
/// timestamp is set at creation (UTC) and never changes. Content is
/// HTML-escaped before it reaches the store, so both history replay and
/// live broadcast carry the escaped form.
///
/// The sender projection is captured at append time: users live in the
/// account service, so there is no local table to join at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub room: String,
    pub content: String,
    pub sender: UserProfile,
    pub timestamp: DateTime<Utc>,
}

/// Wire projection of a message.
///
/// Fields (`id`, `content`, `timestamp`, `sender`, `room`) and their
/// camelCase spellings are part of the wire contract. Timestamps serialize
/// as ISO-8601 / RFC 3339 in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender: UserProfile,
    pub room: String,
}

impl From<StoredMessage> for MessageView {
    fn from(msg: StoredMessage) -> Self {
        Self {
            id: msg.id,
            content: msg.content,
            timestamp: msg.timestamp,
            sender: msg.sender,
            room: msg.room,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredMessage {
        StoredMessage {
            id: 7,
            room: "general".to_string(),
            content: "hello".to_string(),
            sender: UserProfile {
                id: "u-1".to_string(),
                display_name: "Ada".to_string(),
                avatar_url: String::new(),
            },
            timestamp: "2026-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn view_preserves_fields() {
        let view = MessageView::from(sample());
        assert_eq!(view.id, 7);
        assert_eq!(view.room, "general");
        assert_eq!(view.sender.display_name, "Ada");
    }

    #[test]
    fn view_serializes_iso8601_utc() {
        let json = serde_json::to_value(MessageView::from(sample())).unwrap();
        assert_eq!(json["timestamp"], "2026-01-02T03:04:05Z");
        assert_eq!(json["sender"]["displayName"], "Ada");
    }
}
