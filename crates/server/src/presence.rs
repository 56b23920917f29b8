//! Presence registry: which identities currently hold a live connection.

use std::collections::HashMap;

use tokio::sync::mpsc::Sender;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::ServerEvent;

/// Events queued per connection before deliveries start being dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Outbound handle for one live connection. Sends never block; a dedicated
/// pump task drains the channel into the socket, and events to a peer whose
/// queue is full are dropped rather than awaited.
pub type ConnectionHandle = Sender<ServerEvent>;

/// Process-wide table of identity → live connection.
///
/// Holds at most one connection per identity. A new registration silently
/// replaces the old entry; the superseded socket is not closed, its handle
/// is just dropped. The map lock is never held across an await on storage
/// or transport.
#[derive(Default)]
pub struct PresenceRegistry {
    connections: RwLock<HashMap<String, ConnectionHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, overwriting any existing entry for `username`.
    pub async fn register(&self, username: &str, handle: ConnectionHandle) {
        let previous = self
            .connections
            .write()
            .await
            .insert(username.to_string(), handle);
        if previous.is_some() {
            debug!("[Presence] replaced live connection for {}", username);
        }
    }

    /// Remove the entry for `username`. No-op when absent.
    pub async fn unregister(&self, username: &str) {
        self.connections.write().await.remove(username);
    }

    /// Deliver `event` to `username` if a connection is registered.
    ///
    /// At-most-once and best-effort: returns false when the identity is
    /// offline, its channel is already closed, or its outbound queue is
    /// full. Nothing is buffered for later and the caller never waits on
    /// the peer's socket.
    pub async fn route(&self, username: &str, event: ServerEvent) -> bool {
        match self.connections.read().await.get(username) {
            Some(handle) => handle.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Number of live connections.
    pub async fn online_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
