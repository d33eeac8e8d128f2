//! Binary wire messages for board replication and presence.
//!
//! Everything a session can put on the broadcast channel is one
//! bincode-encoded [`BoardMessage`]. Document changes travel as opaque Yrs
//! updates; selection changes travel as full replacement sets; the state
//! vector handshake lets a late joiner pull exactly the updates it is
//! missing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::selection::SelectionUpdate;

/// A message between sessions editing the same board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardMessage {
    /// A client connected and announces itself.
    Join { client_id: Uuid, name: String },

    /// Clean disconnect.
    Leave { client_id: Uuid },

    /// An encoded Yrs update produced by one local transaction.
    Delta { client_id: Uuid, update: Vec<u8> },

    /// A client's selection changed (full replacement set).
    Selection(SelectionUpdate),

    /// Late-join handshake: "here is my state vector, send what I lack".
    SyncRequest {
        client_id: Uuid,
        state_vector: Vec<u8>,
    },

    /// Targeted reply to a [`BoardMessage::SyncRequest`].
    SyncResponse {
        client_id: Uuid,
        to: Uuid,
        update: Vec<u8>,
    },
}

impl BoardMessage {
    /// Get the sending client from any variant.
    pub fn client_id(&self) -> Uuid {
        match self {
            BoardMessage::Join { client_id, .. } => *client_id,
            BoardMessage::Leave { client_id } => *client_id,
            BoardMessage::Delta { client_id, .. } => *client_id,
            BoardMessage::Selection(update) => update.client_id,
            BoardMessage::SyncRequest { client_id, .. } => *client_id,
            BoardMessage::SyncResponse { client_id, .. } => *client_id,
        }
    }

    /// Serialize to binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::SerializationError(e.to_string()))
    }

    /// Deserialize from binary wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (msg, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| ProtocolError::DeserializationError(e.to_string()))?;
        Ok(msg)
    }
}

/// Protocol errors.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    SerializationError(String),
    DeserializationError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializationError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
