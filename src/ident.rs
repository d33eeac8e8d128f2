//! Client identity and id allocation.
//!
//! Notes and groups carry ids that must be globally unique and independent
//! of the client that allocated them, so that replicas never collide when
//! creating content concurrently. UUIDv4 gives us that without any
//! coordination.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Identity of a connected client session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub client_id: Uuid,
    pub name: String,
}

impl ClientInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Create with explicit client_id (for testing)
    pub fn with_id(client_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            client_id,
            name: name.into(),
        }
    }
}

/// Allocate a fresh id for a note or group.
pub fn new_item_id() -> Uuid {
    Uuid::new_v4()
}

/// Wall-clock timestamp in unix milliseconds.
///
/// Timestamps are informational (`created` / `last_changed` on notes);
/// convergence never depends on them.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
