//! Friendship gate and contact bookkeeping.
//!
//! The request/accept workflow is owned by another service; this module
//! keeps the established relationships the message router consults before
//! letting two users exchange messages. Stored in the same SQLite database
//! as the message log.

use anyhow::Result as AnyResult;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

pub struct FriendManager {
    pool: SqlitePool,
}

impl FriendManager {
    pub async fn new(pool: SqlitePool) -> AnyResult<Self> {
        let manager = Self { pool };
        manager.init_schema().await?;
        info!("[Friends] initialized");
        Ok(manager)
    }

    async fn init_schema(&self) -> AnyResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                friend_username TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                UNIQUE(username, friend_username)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record an established friendship. Contacts are stored in both
    /// directions so the gate is a single-row lookup.
    pub async fn befriend(&self, a: &str, b: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        for (username, friend) in [(a, b), (b, a)] {
            sqlx::query(
                "INSERT OR IGNORE INTO contacts (id, username, friend_username, created_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(username)
            .bind(friend)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        info!("[Friends] contact established: {} <-> {}", a, b);
        Ok(())
    }

    /// Authoritative friendship check, consulted on every message send.
    pub async fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contacts WHERE username = ? AND friend_username = ?",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}
