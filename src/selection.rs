//! Ephemeral per-client selection state, reconciled across clients.
//!
//! Selections are presence, not document data: they travel over the session
//! broadcast channel and are never written into the replicated board, so
//! persisted history does not grow with UI churn. Each client owns exactly
//! one entry (its own) and reads everyone's.
//!
//! Structural changes race with selections constantly — a note someone has
//! selected may be deleted or moved by another client at any moment. No
//! cleanup is attempted: entries referencing dead notes simply stop mattering
//! because every read is filtered through current document membership and the
//! connected-client roster.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::board::Board;

/// The three selection gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectAction {
    /// Replace the whole selection with this one note.
    Single,
    /// Toggle this note in or out of the selection, keeping the rest.
    Multi,
    /// Drop this note from the selection, keeping the rest.
    Remove,
}

/// Broadcast after every local selection action: the full replacement set
/// for one client. Carrying the whole set (rather than a diff) makes the
/// message idempotent and self-healing after loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub client_id: Uuid,
    pub selected: Vec<Uuid>,
}

/// All clients' selection entries as seen by one client.
pub struct SelectionRegistry {
    local_client: Uuid,
    entries: HashMap<Uuid, HashSet<Uuid>>,
}

impl SelectionRegistry {
    pub fn new(local_client: Uuid) -> Self {
        Self {
            local_client,
            entries: HashMap::new(),
        }
    }

    pub fn local_client(&self) -> Uuid {
        self.local_client
    }

    /// Apply a local gesture and return the update to broadcast.
    ///
    /// Never fails: acting on a note another client just deleted is a plain
    /// set operation whose effect becomes invisible at read time.
    pub fn apply_local(&mut self, note_id: Uuid, action: SelectAction) -> SelectionUpdate {
        let set = self.entries.entry(self.local_client).or_default();
        match action {
            SelectAction::Single => {
                set.clear();
                set.insert(note_id);
            }
            SelectAction::Multi => {
                if !set.remove(&note_id) {
                    set.insert(note_id);
                }
            }
            SelectAction::Remove => {
                set.remove(&note_id);
            }
        }
        SelectionUpdate {
            client_id: self.local_client,
            selected: set.iter().copied().collect(),
        }
    }

    /// Replace a remote client's entry with the broadcast set. Own echoes
    /// are ignored — the local entry is authoritative here.
    pub fn apply_remote(&mut self, update: &SelectionUpdate) {
        if update.client_id == self.local_client {
            return;
        }
        self.entries.insert(
            update.client_id,
            update.selected.iter().copied().collect(),
        );
    }

    /// Drop a departed client's entry. Optional hygiene: correctness comes
    /// from roster filtering, not from this.
    pub fn forget_client(&mut self, client_id: Uuid) {
        self.entries.remove(&client_id);
    }

    /// Raw entry for a client, unfiltered.
    pub fn selection_of(&self, client_id: Uuid) -> Option<&HashSet<Uuid>> {
        self.entries.get(&client_id)
    }

    /// The local client's current raw selection.
    pub fn local_selection(&self) -> Vec<Uuid> {
        self.entries
            .get(&self.local_client)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Does the local client have this note selected?
    ///
    /// False for any note no longer present in the document, even while a
    /// stale entry still names it.
    pub fn locally_selected(&self, board: &Board, note_id: Uuid) -> bool {
        if !board.contains_note(note_id) {
            return false;
        }
        self.entries
            .get(&self.local_client)
            .is_some_and(|s| s.contains(&note_id))
    }

    /// Does some other *connected* client have this note selected?
    ///
    /// `roster` is the current set of connected client ids; entries from
    /// clients that left (or notes that were deleted) read as unselected
    /// without any cleanup write.
    pub fn remotely_selected(&self, board: &Board, roster: &[Uuid], note_id: Uuid) -> bool {
        if !board.contains_note(note_id) {
            return false;
        }
        self.entries.iter().any(|(client, set)| {
            *client != self.local_client && roster.contains(client) && set.contains(&note_id)
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
