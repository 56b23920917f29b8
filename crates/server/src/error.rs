//! Error taxonomy shared by the socket and REST surfaces.
//!
//! Validation and permission errors are resolved locally and reported to the
//! offending caller; storage failures are surfaced, never swallowed. None of
//! these close a live connection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Not allowed to chat. Not friends.")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            ChatError::PermissionDenied => StatusCode::FORBIDDEN,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}
