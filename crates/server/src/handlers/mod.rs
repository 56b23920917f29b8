//! Handlers for the chat server surface.

pub mod chat;
pub mod ws;

// Re-export AppState from config
pub use crate::config::AppState;

// REST chat handlers
pub use chat::{daily_transcript, last_messages, send_message};

// WebSocket entry point
pub use ws::chat_ws;
