//! Append-only message log on SQLite.
//!
//! Messages are never deleted by this subsystem; the only mutation is the
//! `is_read` flag. Timestamps are stored as RFC 3339 text with fixed
//! microsecond precision so lexicographic and chronological order agree.

use anyhow::Result as AnyResult;
use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{ChatError, Result};
use crate::models::ChatMessage;

/// Daily transcript queries are silently truncated to this many records.
pub const TRANSCRIPT_LIMIT: i64 = 500;

/// Durable store for chat messages.
pub struct MessageStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender: String,
    receiver: String,
    content: String,
    timestamp: String,
    is_read: bool,
}

impl MessageRow {
    fn into_message(self) -> sqlx::Result<ChatMessage> {
        let timestamp = self
            .timestamp
            .parse()
            .map_err(|e: chrono::ParseError| sqlx::Error::ColumnDecode {
                index: "timestamp".to_string(),
                source: Box::new(e),
            })?;

        Ok(ChatMessage {
            id: self.id,
            sender: self.sender,
            receiver: self.receiver,
            content: self.content,
            timestamp,
            is_read: self.is_read,
        })
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl MessageStore {
    /// Create the store on an existing pool, initializing the schema.
    pub async fn new(pool: SqlitePool) -> AnyResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        info!("[Store] message log initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> AnyResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                sender    TEXT NOT NULL,
                receiver  TEXT NOT NULL,
                content   TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                is_read   INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_sender
             ON messages(sender, receiver, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_receiver
             ON messages(receiver, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a message, assigning the identifier and the server timestamp.
    pub async fn append(&self, sender: &str, receiver: &str, content: &str) -> Result<ChatMessage> {
        self.append_at(sender, receiver, content, Utc::now()).await
    }

    /// Persist a message with a caller-supplied timestamp.
    pub async fn append_at(
        &self,
        sender: &str,
        receiver: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<ChatMessage> {
        // Truncate up front so the returned record matches what a later
        // read of the stored text yields.
        let timestamp = timestamp
            .duration_trunc(TimeDelta::microseconds(1))
            .unwrap_or(timestamp);

        let result = sqlx::query(
            "INSERT INTO messages (sender, receiver, content, timestamp, is_read)
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(sender)
        .bind(receiver)
        .bind(content)
        .bind(format_timestamp(&timestamp))
        .execute(&self.pool)
        .await?;

        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: content.to_string(),
            timestamp,
            is_read: false,
        })
    }

    /// Flip `is_read` to true. Returns whether a record was found; an
    /// unknown identifier is a no-op, not an error. Idempotent.
    pub async fn mark_read(&self, message_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All messages between two users in either direction with timestamp in
    /// `[start, end)`, ascending, truncated to [`TRANSCRIPT_LIMIT`] records.
    pub async fn transcript(
        &self,
        user_a: &str,
        user_b: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, sender, receiver, content, timestamp, is_read
            FROM messages
            WHERE ((sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1))
              AND timestamp >= ?3 AND timestamp < ?4
            ORDER BY timestamp ASC, id ASC
            LIMIT ?5
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(format_timestamp(&start))
        .bind(format_timestamp(&end))
        .bind(TRANSCRIPT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(MessageRow::into_message)
            .collect::<sqlx::Result<Vec<_>>>()?)
    }

    /// Every message the user sent or received, most recent first.
    ///
    /// Lazy: rows are pulled as the stream is consumed, and each call starts
    /// a fresh scan.
    pub fn all_involving<'a>(&'a self, username: &'a str) -> BoxStream<'a, Result<ChatMessage>> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender, receiver, content, timestamp, is_read
            FROM messages
            WHERE sender = ?1 OR receiver = ?1
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(username)
        .fetch(&self.pool)
        .map(|row| {
            row.and_then(MessageRow::into_message)
                .map_err(ChatError::from)
        })
        .boxed()
    }

    /// Count of messages sent `from` → `to` that are still unread.
    pub async fn count_unread(&self, from: &str, to: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE sender = ? AND receiver = ? AND is_read = 0",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
