//! Socialice Chat Server Library
//!
//! Real-time direct messaging between friends: a WebSocket message router
//! with a process-wide presence registry, a durable message log on SQLite,
//! and per-conversation rollups with unread counts.

pub mod config;
pub mod conversations;
pub mod directory;
pub mod error;
pub mod friends;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{AppState, ServerConfig};
use directory::UserDirectory;
use friends::FriendManager;
use handlers::{chat_ws, daily_transcript, last_messages, send_message};
use presence::PresenceRegistry;
use store::MessageStore;

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    info!("=== Socialice Chat Server ===");
    info!("Features: Friend-gated DMs | WebSocket routing | Conversation rollups");

    let config = ServerConfig::from_env();
    info!("Database: {:?}", config.database_path);

    let pool = config.connect_pool().await?;

    let store = Arc::new(MessageStore::new(pool.clone()).await?);
    let directory = Arc::new(UserDirectory::new(pool.clone()).await?);
    let friends = Arc::new(FriendManager::new(pool).await?);
    let presence = Arc::new(PresenceRegistry::new());

    let app_state = AppState {
        store,
        directory,
        friends,
        presence,
    };

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the service router; separate from `run` so tests can drive it.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Real-time chat socket
        .route("/ws/chat/{username}", get(chat_ws))
        // REST equivalents backed by the same core
        .route("/chat/send", post(send_message))
        .route("/chat/daily", get(daily_transcript))
        .route("/chat/last-messages/{username}", get(last_messages))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK - Socialice Chat Server"
}
