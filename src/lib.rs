//! # board-collab — Synchronization core for a shared sticky-note board
//!
//! Multiple clients co-edit one hierarchical board of groups and notes.
//! Every client applies mutations optimistically to its local replica; the
//! CRDT substrate (Yrs) merges concurrent edits so that all replicas
//! converge without locks, while an ephemeral selection channel shows who
//! has which note selected right now.
//!
//! ## Architecture
//!
//! ```text
//! user action ──► Mutation op / Selection action
//!                      │
//!                      ▼
//!               ┌──────────────┐   encoded update    ┌─────────────┐
//!               │ BoardReplica │ ──────────────────► │ SessionHub  │
//!               │ (per client) │ ◄────────────────── │ (fan-out +  │
//!               └──────┬───────┘   BoardMessage      │  roster)    │
//!                      │                             └─────────────┘
//!                      ▼
//!               ┌──────────────┐
//!               │ Yrs Doc      │──► ChangeBridge ──► view recompute
//!               │ (board tree) │
//!               └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ident`] — client identity and id allocation
//! - [`board`] — the replicated document model (items / groups / notes)
//! - [`ops`] — convergence-safe mutation operations
//! - [`selection`] — per-client ephemeral selection protocol
//! - [`protocol`] — binary wire messages (bincode-encoded BoardMessage)
//! - [`broadcast`] — session hub: membership roster + message fan-out
//! - [`bridge`] — change notification bridge over the Yrs subscription
//! - [`replica`] — per-client façade tying board, selection and roster

pub mod ident;
pub mod board;
pub mod ops;
pub mod selection;
pub mod protocol;
pub mod broadcast;
pub mod bridge;
pub mod replica;

// Re-exports for convenience
pub use ident::{new_item_id, now_millis, ClientInfo};
pub use board::{
    Board, BoardError, BoardSnapshot, ContainerId, GroupSnapshot, ItemKind,
    ItemSnapshot, NoteSnapshot,
};
pub use ops::{GroupCreated, NoteCreated, OpError};
pub use selection::{SelectAction, SelectionRegistry, SelectionUpdate};
pub use protocol::{BoardMessage, ProtocolError};
pub use broadcast::{HubStats, SessionHub};
pub use bridge::ChangeBridge;
pub use replica::BoardReplica;
