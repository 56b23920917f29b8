//! Chat server configuration and shared state.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use crate::directory::UserDirectory;
use crate::friends::FriendManager;
use crate::presence::PresenceRegistry;
use crate::store::MessageStore;

/// Configuration for the Socialice chat server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite database file holding messages, users and contacts.
    pub database_path: PathBuf,
    /// Bind address for the HTTP/WebSocket listener.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("socialice.sqlite"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// `SOCIALICE_DB` overrides the database path, `SOCIALICE_ADDR` the bind
    /// address.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SOCIALICE_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("SOCIALICE_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(_) => warn!("Ignoring unparseable SOCIALICE_ADDR: {}", addr),
            }
        }

        config
    }

    /// Open the SQLite pool, creating the database file if missing.
    pub async fn connect_pool(&self) -> anyhow::Result<SqlitePool> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", self.database_path.display()))?
                .create_if_missing(true);
        Ok(SqlitePoolOptions::new().connect_with(options).await?)
    }
}

/// App state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MessageStore>,
    pub directory: Arc<UserDirectory>,
    pub friends: Arc<FriendManager>,
    pub presence: Arc<PresenceRegistry>,
}
