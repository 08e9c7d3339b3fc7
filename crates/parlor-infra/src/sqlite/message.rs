//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `parlor-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, RFC 3339 text
//! timestamps. The single-connection writer serializes appends, which is
//! what makes store-assigned ids monotonic.

use chrono::{DateTime, Utc};
use parlor_core::repository::MessageRepository;
use parlor_types::error::RepositoryError;
use parlor_types::message::StoredMessage;
use parlor_types::user::UserProfile;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct MessageRow {
    id: i64,
    room: String,
    sender_id: String,
    sender_display_name: String,
    sender_avatar_url: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            room: row.try_get("room")?,
            sender_id: row.try_get("sender_id")?,
            sender_display_name: row.try_get("sender_display_name")?,
            sender_avatar_url: row.try_get("sender_avatar_url")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let timestamp = parse_datetime(&self.created_at)?;
        Ok(StoredMessage {
            id: self.id,
            room: self.room,
            content: self.content,
            sender: UserProfile {
                id: self.sender_id,
                display_name: self.sender_display_name,
                avatar_url: self.sender_avatar_url,
            },
            timestamp,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

// ---------------------------------------------------------------------------
// MessageRepository implementation
// ---------------------------------------------------------------------------

impl MessageRepository for SqliteMessageRepository {
    async fn append(
        &self,
        room: &str,
        sender: &UserProfile,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError> {
        let timestamp = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO messages (room, sender_id, sender_display_name, sender_avatar_url, content, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(room)
        .bind(&sender.id)
        .bind(&sender.display_name)
        .bind(&sender.avatar_url)
        .bind(content)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            room: room.to_string(),
            content: content.to_string(),
            sender: sender.clone(),
            timestamp,
        })
    }

    async fn recent(&self, room: &str, limit: u32) -> Result<Vec<StoredMessage>, RepositoryError> {
        // Newest N first, then re-ordered chronologically: "most recent N"
        // and "ascending by timestamp" are different orderings.
        let rows = sqlx::query(
            r#"SELECT id, room, sender_id, sender_display_name, sender_avatar_url, content, created_at
               FROM messages
               WHERE room = ?
               ORDER BY created_at DESC, id DESC
               LIMIT ?"#,
        )
        .bind(room)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = rows
            .iter()
            .map(|row| {
                MessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> SqliteMessageRepository {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        SqliteMessageRepository::new(DatabasePool::new(&url).await.unwrap())
    }

    fn sender(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            display_name: name.to_string(),
            avatar_url: format!("https://example.com/{id}.png"),
        }
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let repo = test_repo().await;
        let ada = sender("u-1", "Ada");

        let first = repo.append("general", &ada, "one").await.unwrap();
        let second = repo.append("general", &ada, "two").await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.sender.display_name, "Ada");
    }

    #[tokio::test]
    async fn recent_respects_limit_and_ascending_order() {
        let repo = test_repo().await;
        let ada = sender("u-1", "Ada");

        repo.append("general", &ada, "m1").await.unwrap();
        repo.append("general", &ada, "m2").await.unwrap();
        repo.append("general", &ada, "m3").await.unwrap();

        let messages = repo.recent("general", 2).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3"]);
        assert!(messages[0].timestamp <= messages[1].timestamp);
        assert!(messages[0].id < messages[1].id);
    }

    #[tokio::test]
    async fn recent_returns_at_most_limit() {
        let repo = test_repo().await;
        let ada = sender("u-1", "Ada");
        for i in 0..5 {
            repo.append("general", &ada, &format!("m{i}")).await.unwrap();
        }

        assert_eq!(repo.recent("general", 3).await.unwrap().len(), 3);
        assert_eq!(repo.recent("general", 50).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let repo = test_repo().await;
        let ada = sender("u-1", "Ada");

        repo.append("general", &ada, "in general").await.unwrap();
        repo.append("dev", &ada, "in dev").await.unwrap();

        let general = repo.recent("general", 50).await.unwrap();
        assert_eq!(general.len(), 1);
        assert_eq!(general[0].content, "in general");

        let empty = repo.recent("lounge", 50).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn sender_projection_round_trips() {
        let repo = test_repo().await;
        let ada = sender("u-1", "Ada");

        repo.append("general", &ada, "hello").await.unwrap();
        let messages = repo.recent("general", 1).await.unwrap();

        assert_eq!(messages[0].sender, ada);
    }
}
