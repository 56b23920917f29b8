use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted direct message.
///
/// Immutable once stored, except for `is_read` which a read receipt flips
/// from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Public user info resolved through the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Client → server events on the chat socket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Send a direct message to a friend.
    Message {
        sender: String,
        receiver: String,
        content: String,
    },
    /// Ephemeral typing signal; never persisted.
    Typing { receiver: String },
    StopTyping { receiver: String },
    /// Mark a stored message as read and notify its original sender.
    ReadReceipt { message_id: i64, sender: String },
}

/// Server → client events on the chat socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A delivered message, carrying the server-assigned id and timestamp.
    Message(ChatMessage),
    Typing { from: String },
    StopTyping { from: String },
    ReadReceipt { message_id: i64 },
    /// Inline protocol error; the connection stays open.
    Error { error: String },
}

/// Body for POST /chat/send.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_username: String,
    pub receiver_username: String,
    pub message: String,
}

/// REST representation of a stored message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub id: i64,
    pub sender_username: String,
    pub receiver_username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender_username: message.sender,
            receiver_username: message.receiver,
            message: message.content,
            timestamp: message.timestamp,
            is_read: message.is_read,
        }
    }
}

/// Per-counterpart rollup: the latest message exchanged with one user plus
/// how many of their messages are still unread. Derived on every query,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub user_id: String,
    pub username: String,
    pub profile_pic: String,
    pub last_message: String,
    pub timestamp: DateTime<Utc>,
    pub unread_count: i64,
}
