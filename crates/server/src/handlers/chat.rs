//! REST chat endpoints.
//!
//! Same storage and friendship gate as the socket path; a reader polling
//! these endpoints observes socket writes eventually, not linearizably.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppState;
use crate::conversations::latest_conversations;
use crate::error::{ChatError, Result};
use crate::models::{ChatMessageResponse, SendMessageRequest};

/// POST /chat/send
///
/// Persists a message without pushing it to a live receiver connection;
/// recipients observe it through transcripts and unread counts.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatMessageResponse>> {
    info!(
        "POST /chat/send - {} -> {}",
        req.sender_username, req.receiver_username
    );

    for username in [&req.sender_username, &req.receiver_username] {
        if !state.directory.exists(username).await? {
            return Err(ChatError::NotFound(format!("user '{}'", username)));
        }
    }
    if !state
        .friends
        .are_friends(&req.sender_username, &req.receiver_username)
        .await?
    {
        return Err(ChatError::PermissionDenied);
    }

    let message = state
        .store
        .append(&req.sender_username, &req.receiver_username, &req.message)
        .await?;

    Ok(Json(message.into()))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub sender_username: String,
    pub receiver_username: String,
}

/// GET /chat/daily
///
/// Both directions of a participant pair within the current UTC day,
/// ascending by timestamp, capped at 500 records.
pub async fn daily_transcript(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Vec<ChatMessageResponse>>> {
    info!(
        "GET /chat/daily - {} <-> {}",
        query.sender_username, query.receiver_username
    );

    for username in [&query.sender_username, &query.receiver_username] {
        if !state.directory.exists(username).await? {
            return Err(ChatError::NotFound(format!("user '{}'", username)));
        }
    }

    let (start, end) = today_window();
    let messages = state
        .store
        .transcript(&query.sender_username, &query.receiver_username, start, end)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct LastMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// GET /chat/last-messages/{username}
pub async fn last_messages(
    Path(username): Path<String>,
    Query(query): Query<LastMessagesQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    info!("GET /chat/last-messages/{}", username);

    if !state.directory.exists(&username).await? {
        return Err(ChatError::NotFound(format!("user '{}'", username)));
    }

    let summaries =
        latest_conversations(&state.store, &state.directory, &username, query.limit).await?;

    Ok(Json(json!({
        "success": true,
        "data": summaries,
    })))
}

/// Current UTC day as a half-open window.
fn today_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
