//! Session hub: membership roster plus fan-out to connected sessions.
//!
//! Presence and deltas share one broadcast channel per board. Every session
//! that joins gets an independent receiver buffering up to `capacity`
//! messages; the hub also carries the ambient roster of connected client
//! ids that the selection predicates filter against.
//!
//! Sends are lock-free on the hot path (tokio broadcast + atomic counters).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::ident::ClientInfo;
use crate::protocol::{BoardMessage, ProtocolError};

/// Statistics for monitoring hub health.
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    pub messages_sent: u64,
    pub connected_clients: usize,
}

/// Fan-out hub for the sessions editing one board.
pub struct SessionHub {
    /// Broadcast channel sender, shared by all sessions.
    sender: broadcast::Sender<Arc<Vec<u8>>>,

    /// Connected clients — the membership roster.
    clients: Arc<RwLock<HashMap<Uuid, ClientInfo>>>,

    /// Messages buffered per receiver before lagging sessions drop.
    capacity: usize,

    /// Lock-free send counter.
    messages_sent: Arc<AtomicU64>,
}

impl SessionHub {
    /// Create a hub with the given per-receiver buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            clients: Arc::new(RwLock::new(HashMap::new())),
            capacity,
            messages_sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Connect a session: adds it to the roster and returns its receiver.
    pub async fn join(&self, info: ClientInfo) -> broadcast::Receiver<Arc<Vec<u8>>> {
        let mut clients = self.clients.write().await;
        clients.insert(info.client_id, info);
        self.sender.subscribe()
    }

    /// Disconnect a session, removing it from the roster.
    pub async fn leave(&self, client_id: &Uuid) -> Option<ClientInfo> {
        let mut clients = self.clients.write().await;
        clients.remove(client_id)
    }

    /// Broadcast a message to every connected session (including the
    /// sender's own receiver — filtering echoes is the replica's job).
    pub fn publish(&self, msg: &BoardMessage) -> Result<usize, ProtocolError> {
        let encoded = Arc::new(msg.encode()?);
        Ok(self.publish_raw(encoded))
    }

    /// Broadcast pre-encoded bytes (zero-copy fast path).
    pub fn publish_raw(&self, encoded: Arc<Vec<u8>>) -> usize {
        let count = self.sender.send(encoded).unwrap_or(0);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        count
    }

    /// Current roster of connected client ids.
    pub async fn roster(&self) -> Vec<Uuid> {
        self.clients.read().await.keys().copied().collect()
    }

    /// Full client infos for everyone connected.
    pub async fn clients(&self) -> Vec<ClientInfo> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Whether a client is currently connected.
    pub async fn is_connected(&self, client_id: &Uuid) -> bool {
        self.clients.read().await.contains_key(client_id)
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Subscribe without joining the roster (observers, tests).
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Vec<u8>>> {
        self.sender.subscribe()
    }

    /// Per-receiver buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lock-free stats snapshot.
    pub async fn stats(&self) -> HubStats {
        HubStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            connected_clients: self.clients.read().await.len(),
        }
    }
}
