//! Per-client replica: one client's board, selection and roster view.
//!
//! The replica is transport-agnostic. Local mutations apply optimistically
//! and hand back the [`BoardMessage`] to publish; incoming messages feed
//! [`BoardReplica::handle_message`], which ignores the client's own echoes
//! (the hub fans every message back to its sender) and occasionally produces
//! a reply — its own `Join` when greeting a newcomer, or a targeted
//! `SyncResponse` when a late joiner asks for missing state.

use std::collections::HashMap;
use uuid::Uuid;

use crate::board::{Board, BoardSnapshot, ContainerId, NoteSnapshot};
use crate::bridge::ChangeBridge;
use crate::ident::ClientInfo;
use crate::ops::OpError;
use crate::protocol::BoardMessage;
use crate::selection::{SelectAction, SelectionRegistry};

/// One client's view of the shared board.
pub struct BoardReplica {
    info: ClientInfo,
    board: Board,
    selection: SelectionRegistry,
    /// Connected clients as learned from Join/Leave traffic, self included.
    roster: HashMap<Uuid, ClientInfo>,
}

impl BoardReplica {
    pub fn new(info: ClientInfo) -> Self {
        let mut roster = HashMap::new();
        roster.insert(info.client_id, info.clone());
        Self {
            selection: SelectionRegistry::new(info.client_id),
            board: Board::new(),
            info,
            roster,
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.info.client_id
    }

    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    // ── connection lifecycle ─────────────────────────────────────

    /// Announcement to publish right after connecting.
    pub fn join_message(&self) -> BoardMessage {
        BoardMessage::Join {
            client_id: self.info.client_id,
            name: self.info.name.clone(),
        }
    }

    /// Handshake request pulling the updates this replica is missing.
    pub fn sync_request(&self) -> BoardMessage {
        BoardMessage::SyncRequest {
            client_id: self.info.client_id,
            state_vector: self.board.state_vector(),
        }
    }

    /// Clean-disconnect announcement.
    pub fn leave_message(&self) -> BoardMessage {
        BoardMessage::Leave {
            client_id: self.info.client_id,
        }
    }

    // ── local mutations ──────────────────────────────────────────

    /// Add a note; `None` when the container was concurrently deleted.
    pub fn add_note(
        &self,
        container: ContainerId,
        initial_text: &str,
    ) -> Option<(Uuid, BoardMessage)> {
        let created = self
            .board
            .add_note(container, initial_text, self.info.client_id)?;
        Some((created.note_id, self.delta(created.update)))
    }

    pub fn delete_note(&self, note_id: Uuid) -> BoardMessage {
        let update = self.board.delete_note(note_id);
        self.delta(update)
    }

    /// Toggle this client's own vote on a note.
    pub fn toggle_vote(&self, note_id: Uuid) -> BoardMessage {
        let update = self.board.toggle_vote(note_id, self.info.client_id);
        self.delta(update)
    }

    pub fn update_note_text(&self, note_id: Uuid, new_text: &str) -> BoardMessage {
        let update = self.board.update_note_text(note_id, new_text);
        self.delta(update)
    }

    pub fn move_item(
        &self,
        item_id: Uuid,
        target_index: u32,
        target: ContainerId,
    ) -> Result<BoardMessage, OpError> {
        let update = self.board.move_item(item_id, target_index, target)?;
        Ok(self.delta(update))
    }

    pub fn move_to_end(
        &self,
        index: u32,
        source: ContainerId,
        dest: ContainerId,
    ) -> BoardMessage {
        let update = self.board.move_to_end(index, source, dest);
        self.delta(update)
    }

    pub fn add_group(&self, name: &str) -> (Uuid, BoardMessage) {
        let created = self.board.add_group(name);
        (created.group_id, self.delta(created.update))
    }

    pub fn update_group_name(&self, group_id: Uuid, name: &str) -> BoardMessage {
        let update = self.board.update_group_name(group_id, name);
        self.delta(update)
    }

    pub fn delete_group(&self, group_id: Uuid) -> BoardMessage {
        let update = self.board.delete_group(group_id);
        self.delta(update)
    }

    /// Apply a selection gesture and return the update to publish.
    pub fn select(&mut self, note_id: Uuid, action: SelectAction) -> BoardMessage {
        BoardMessage::Selection(self.selection.apply_local(note_id, action))
    }

    fn delta(&self, update: Vec<u8>) -> BoardMessage {
        BoardMessage::Delta {
            client_id: self.info.client_id,
            update,
        }
    }

    // ── incoming traffic ─────────────────────────────────────────

    /// Apply a message from the channel. Returns an optional reply for the
    /// caller to publish.
    pub fn handle_message(&mut self, msg: &BoardMessage) -> Option<BoardMessage> {
        // The hub fans our own messages back to us; skip them.
        if msg.client_id() == self.info.client_id {
            return None;
        }

        match msg {
            BoardMessage::Join { client_id, name } => {
                let newcomer = !self.roster.contains_key(client_id);
                self.roster
                    .insert(*client_id, ClientInfo::with_id(*client_id, name.clone()));
                if newcomer {
                    // Greet back so the newcomer learns about us too.
                    Some(self.join_message())
                } else {
                    None
                }
            }

            BoardMessage::Leave { client_id } => {
                self.roster.remove(client_id);
                self.selection.forget_client(*client_id);
                None
            }

            BoardMessage::Delta { update, client_id } => {
                if let Err(e) = self.board.apply_update(update) {
                    log::warn!("dropping malformed delta from {client_id}: {e}");
                }
                None
            }

            BoardMessage::Selection(update) => {
                self.selection.apply_remote(update);
                None
            }

            BoardMessage::SyncRequest {
                client_id,
                state_vector,
            } => match self.board.encode_diff(state_vector) {
                Ok(update) => Some(BoardMessage::SyncResponse {
                    client_id: self.info.client_id,
                    to: *client_id,
                    update,
                }),
                Err(e) => {
                    log::warn!("bad state vector from {client_id}: {e}");
                    None
                }
            },

            BoardMessage::SyncResponse { to, update, client_id } => {
                if *to == self.info.client_id {
                    if let Err(e) = self.board.apply_update(update) {
                        log::warn!("dropping malformed sync response from {client_id}: {e}");
                    }
                }
                None
            }
        }
    }

    // ── derived reads (for the rendering layer) ──────────────────

    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn note(&self, note_id: Uuid) -> Option<NoteSnapshot> {
        self.board.note(note_id)
    }

    /// Connected client ids as currently known, self included.
    pub fn roster(&self) -> Vec<Uuid> {
        self.roster.keys().copied().collect()
    }

    /// Does this client have the note selected? False once the note is gone
    /// from the document, whatever the selection entries say.
    pub fn locally_selected(&self, note_id: Uuid) -> bool {
        self.selection.locally_selected(&self.board, note_id)
    }

    /// Does some other connected client have the note selected?
    pub fn remotely_selected(&self, note_id: Uuid) -> bool {
        let roster = self.roster();
        self.selection
            .remotely_selected(&self.board, &roster, note_id)
    }

    /// Subscribe a view-refresh callback to this replica's board.
    pub fn attach_bridge<F>(&self, callback: F) -> ChangeBridge
    where
        F: Fn() + Send + Sync + 'static,
    {
        ChangeBridge::attach(&self.board, callback)
    }
}
