//! User directory: profile lookups for the chat core.
//!
//! Account registration, OTP verification and profile editing are owned by
//! another service. This module answers "does this user exist" and "what do
//! they look like", plus a seeding surface for tests and bootstrap scripts.

use anyhow::Result as AnyResult;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::UserProfile;

pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub async fn new(pool: SqlitePool) -> AnyResult<Self> {
        let directory = Self { pool };
        directory.init_schema().await?;
        info!("[Directory] initialized");
        Ok(directory)
    }

    async fn init_schema(&self) -> AnyResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id         TEXT PRIMARY KEY,
                username   TEXT NOT NULL UNIQUE,
                avatar_url TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a user record. Usernames are unique; inserting a duplicate is
    /// a storage error.
    pub async fn create_user(
        &self,
        username: &str,
        avatar_url: Option<&str>,
    ) -> Result<UserProfile> {
        let profile = UserProfile {
            user_id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            avatar_url: avatar_url.map(|url| url.to_string()),
        };

        sqlx::query("INSERT INTO users (id, username, avatar_url, created_at) VALUES (?, ?, ?, ?)")
            .bind(&profile.user_id)
            .bind(&profile.username)
            .bind(&profile.avatar_url)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Public profile for a username, or None when unknown.
    pub async fn profile(&self, username: &str) -> Result<Option<UserProfile>> {
        let row: Option<(String, String, Option<String>)> =
            sqlx::query_as("SELECT id, username, avatar_url FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(user_id, username, avatar_url)| UserProfile {
            user_id,
            username,
            avatar_url,
        }))
    }
}
