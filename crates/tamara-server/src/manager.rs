//! Live connection registry with best-effort broadcast.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tamara_common::SessionId;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::protocol::ServerEvent;

/// Outbound side of one connected client.
pub struct SessionHandle {
    pub tx: mpsc::Sender<ServerEvent>,
    pub peer: SocketAddr,
    pub connected_at: Instant,
}

/// Thread-safe registry of connected sessions.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: SessionId, peer: SocketAddr, tx: mpsc::Sender<ServerEvent>) {
        let mut map = self.sessions.write().await;
        map.insert(
            id.clone(),
            SessionHandle {
                tx,
                peer,
                connected_at: Instant::now(),
            },
        );
        info!(session = %id.short(), %peer, total = map.len(), "client connected");
    }

    /// Remove a session. Returns false if it was already gone.
    pub async fn unregister(&self, id: &SessionId) -> bool {
        let mut map = self.sessions.write().await;
        match map.remove(id) {
            Some(handle) => {
                info!(
                    session = %id.short(),
                    peer = %handle.peer,
                    secs = handle.connected_at.elapsed().as_secs(),
                    total = map.len(),
                    "client disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Send `event` to every session without waiting on any of them.
    ///
    /// Sessions whose queue is full or closed are dropped from the
    /// registry. Returns the number of sessions that accepted the event.
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        let mut map = self.sessions.write().await;
        let mut delivered = 0;
        map.retain(|id, handle| match handle.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                debug!(session = %id.short(), error = %e, "broadcast failed, removing session");
                false
            }
        });
        delivered
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }
}
