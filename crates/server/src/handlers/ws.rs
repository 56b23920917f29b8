//! WebSocket message router: one task per live connection.
//!
//! A connection is registered in the presence registry on upgrade and
//! unregistered when the transport closes, abnormal termination included.
//! Inbound events are processed strictly in arrival order; a shape error or
//! a denied send is answered inline and never ends the session.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::AppState;
use crate::error::{ChatError, Result};
use crate::models::{ClientEvent, ServerEvent};
use crate::presence::OUTBOUND_CAPACITY;

/// GET /ws/chat/{username}
pub async fn chat_ws(
    Path(username): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, username))
}

async fn handle_socket(socket: WebSocket, state: AppState, username: String) {
    let (outbound, mut events) = mpsc::channel::<ServerEvent>(OUTBOUND_CAPACITY);
    let reply = outbound.clone();

    state.presence.register(&username, outbound).await;
    info!(
        "[Chat] {} connected ({} online)",
        username,
        state.presence.online_count().await
    );

    let (mut sink, mut stream) = socket.split();

    // Pump task: drain the outbound channel into the socket. route() only
    // ever pushes onto the channel, so a slow peer never stalls the task
    // that produced the event; once the channel fills up further pushes
    // are dropped.
    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            Message::Text(text) => {
                if let Err(err) = dispatch_event(&state, &username, text.as_str()).await {
                    warn!("[Chat] event from {} failed: {}", username, err);
                    let _ = reply.try_send(ServerEvent::Error {
                        error: err.to_string(),
                    });
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.presence.unregister(&username).await;
    pump.abort();
    info!("[Chat] {} disconnected", username);
}

/// Decode and apply one inbound event.
///
/// Every error this returns is recoverable: the connection loop reports it
/// on the same socket and keeps reading.
pub async fn dispatch_event(state: &AppState, username: &str, text: &str) -> Result<()> {
    let event: ClientEvent =
        serde_json::from_str(text).map_err(|e| ChatError::MalformedEvent(e.to_string()))?;

    match event {
        ClientEvent::Message {
            sender,
            receiver,
            content,
        } => {
            if sender == receiver {
                return Err(ChatError::MalformedEvent(
                    "sender and receiver must differ".to_string(),
                ));
            }
            if !state.friends.are_friends(&sender, &receiver).await? {
                return Err(ChatError::PermissionDenied);
            }

            // Persist before attempting delivery, so a pushed message always
            // exists in the store. The sender is not told whether the push
            // landed.
            let message = state.store.append(&sender, &receiver, &content).await?;
            state
                .presence
                .route(&receiver, ServerEvent::Message(message))
                .await;
        }
        ClientEvent::Typing { receiver } => {
            state
                .presence
                .route(
                    &receiver,
                    ServerEvent::Typing {
                        from: username.to_string(),
                    },
                )
                .await;
        }
        ClientEvent::StopTyping { receiver } => {
            state
                .presence
                .route(
                    &receiver,
                    ServerEvent::StopTyping {
                        from: username.to_string(),
                    },
                )
                .await;
        }
        ClientEvent::ReadReceipt { message_id, sender } => {
            // Unknown identifiers are a silent no-op, not an error.
            state.store.mark_read(message_id).await?;
            state
                .presence
                .route(&sender, ServerEvent::ReadReceipt { message_id })
                .await;
        }
    }

    Ok(())
}
