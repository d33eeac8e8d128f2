//! Mutation operations over the board tree.
//!
//! Every operation runs one Yrs transaction: it re-resolves its targets by
//! id at invocation time (positions captured earlier in a UI interaction are
//! never trusted), applies the optimistic local mutation, and returns the
//! encoded update for replication. A target that a concurrent peer already
//! removed makes the operation a silent no-op — in a converging multi-writer
//! document that is an expected outcome, not an error.
//!
//! The one rejected-up-front condition is invalid placement (a group inside
//! a group): that is a caller bug, and the transaction is dropped without
//! mutating anything.

use uuid::Uuid;
use yrs::{Any, Array, ArrayPrelim, ArrayRef, Map, MapRef, Out, Transact};

use crate::board::{
    read_kind, read_note_snapshot, write_note, Board, ContainerId, ItemKind, NoteSnapshot,
    KEY_LAST_CHANGED, KEY_NAME, KEY_TEXT, KEY_VOTES, KIND_GROUP, KEY_ID, KEY_KIND, KEY_NOTES,
};
use crate::ident::{new_item_id, now_millis};

/// Result of [`Board::add_note`]: the fresh note id plus the update to
/// replicate.
#[derive(Debug, Clone)]
pub struct NoteCreated {
    pub note_id: Uuid,
    pub update: Vec<u8>,
}

/// Result of [`Board::add_group`].
#[derive(Debug, Clone)]
pub struct GroupCreated {
    pub group_id: Uuid,
    pub update: Vec<u8>,
}

/// Operation errors. Only placement violations surface; structural races
/// are absorbed as no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    InvalidPlacement(String),
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPlacement(e) => write!(f, "invalid placement: {e}"),
        }
    }
}

impl std::error::Error for OpError {}

/// Translate "remove, then insert at `final_index`" into the list move's
/// target coordinate, which is an insert position measured before the move
/// (so moving right passes the slot after the destination, and moving to
/// the end passes the sequence length).
fn move_target(source: u32, final_index: u32) -> u32 {
    if final_index > source {
        final_index + 1
    } else {
        final_index
    }
}

impl Board {
    /// Create a note at the end of `container`.
    ///
    /// Returns `None` when the container has been concurrently deleted (the
    /// re-creation race): the mutation is discarded rather than reviving a
    /// detached subtree.
    pub fn add_note(
        &self,
        container: ContainerId,
        initial_text: &str,
        author: Uuid,
    ) -> Option<NoteCreated> {
        let mut txn = self.doc().transact_mut();
        let target = match self.resolve_container(&txn, container) {
            Some(t) => t,
            None => {
                log::debug!("add_note into deleted container {container:?} ignored");
                return None;
            }
        };
        let now = now_millis();
        let snap = NoteSnapshot {
            id: new_item_id(),
            text: initial_text.to_string(),
            author,
            votes: Vec::new(),
            created: now,
            last_changed: now,
        };
        let len = target.len(&txn);
        write_note(&mut txn, &target, len, &snap);
        Some(NoteCreated {
            note_id: snap.id,
            update: txn.encode_update_v1(),
        })
    }

    /// Remove a note from wherever it currently lives.
    ///
    /// Idempotent: deleting an already-deleted note is a no-op, never an
    /// error — two clients may race to delete the same note.
    pub fn delete_note(&self, note_id: Uuid) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        match self.locate_note(&txn, note_id) {
            Some(site) => {
                site.array.remove(&mut txn, site.index);
            }
            None => {
                log::debug!("delete of missing note {note_id} ignored");
            }
        }
        txn.encode_update_v1()
    }

    /// Toggle `client_id`'s membership in the note's vote set.
    ///
    /// Membership toggle, not an index flip: each client's vote is its own
    /// boolean, so concurrent toggles by different clients are independent
    /// and converge. Toggling off removes every occurrence, so the
    /// no-duplicates invariant survives any merge residue.
    pub fn toggle_vote(&self, note_id: Uuid, client_id: Uuid) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        if let Some(site) = self.locate_note(&txn, note_id) {
            if let Some(Out::YArray(votes)) = site.note.get(&txn, KEY_VOTES) {
                let key = client_id.to_string();
                let mut removed = false;
                let mut i = 0u32;
                while i < votes.len(&txn) {
                    let is_ours = matches!(
                        votes.get(&txn, i),
                        Some(Out::Any(Any::String(s))) if s.as_ref() == key.as_str()
                    );
                    if is_ours {
                        votes.remove(&mut txn, i);
                        removed = true;
                    } else {
                        i += 1;
                    }
                }
                if !removed {
                    votes.push_back(&mut txn, key);
                }
            }
        } else {
            log::debug!("vote toggle on missing note {note_id} ignored");
        }
        txn.encode_update_v1()
    }

    /// Replace the note's text wholesale and stamp `last_changed`.
    ///
    /// Concurrent edits resolve by field-level last-writer-wins; no
    /// character merging is attempted.
    pub fn update_note_text(&self, note_id: Uuid, new_text: &str) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        if let Some(site) = self.locate_note(&txn, note_id) {
            site.note.insert(&mut txn, KEY_TEXT, new_text);
            site.note.insert(&mut txn, KEY_LAST_CHANGED, now_millis());
        } else {
            log::debug!("text edit of missing note {note_id} ignored");
        }
        txn.encode_update_v1()
    }

    /// Move an item to `target_index` of `target`.
    ///
    /// A note may move into the root sequence or any group's notes; a group
    /// may move only within the root sequence. Violations are rejected
    /// before any mutation. A concurrently deleted item or target makes the
    /// move a no-op. The target index is clamped to the valid range.
    pub fn move_item(
        &self,
        item_id: Uuid,
        target_index: u32,
        target: ContainerId,
    ) -> Result<Vec<u8>, OpError> {
        let mut txn = self.doc().transact_mut();

        if let Some(group_site) = self.locate_group(&txn, item_id) {
            // Groups never nest; reject before touching the tree.
            if target != ContainerId::Root {
                return Err(OpError::InvalidPlacement(
                    "a group cannot be placed inside a group".into(),
                ));
            }
            let len = self.items().len(&txn);
            let to = target_index.min(len.saturating_sub(1));
            if to != group_site.index {
                self.items()
                    .move_to(&mut txn, group_site.index, move_target(group_site.index, to));
            }
            return Ok(txn.encode_update_v1());
        }

        let site = match self.locate_note(&txn, item_id) {
            Some(s) => s,
            None => {
                log::debug!("move of missing item {item_id} ignored");
                return Ok(txn.encode_update_v1());
            }
        };
        let dest = match self.resolve_container(&txn, target) {
            Some(d) => d,
            None => {
                log::debug!("move into deleted container {target:?} ignored");
                return Ok(txn.encode_update_v1());
            }
        };

        if site.container == target {
            // Reorder within one sequence: the list CRDT's native move, so
            // a concurrent delete of this note wins over the reorder.
            let len = dest.len(&txn);
            let to = target_index.min(len.saturating_sub(1));
            if to != site.index {
                dest.move_to(&mut txn, site.index, move_target(site.index, to));
            }
        } else {
            // Crossing containers: the note's content travels under its
            // stable id.
            let snap = match read_note_snapshot(&txn, &site.note) {
                Some(s) => s,
                None => return Ok(txn.encode_update_v1()),
            };
            site.array.remove(&mut txn, site.index);
            let to = target_index.min(dest.len(&txn));
            write_note(&mut txn, &dest, to, &snap);
        }
        Ok(txn.encode_update_v1())
    }

    /// Append the note currently at `index` of `source` to the end of
    /// `dest`.
    ///
    /// Used when a dropped note's origin container differs from its current
    /// structural parent because of a race; an index that has gone out of
    /// range — or no longer holds a note — means the board changed under
    /// the gesture, and the drop is dropped.
    pub fn move_to_end(&self, index: u32, source: ContainerId, dest: ContainerId) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        let src = match self.resolve_container(&txn, source) {
            Some(s) => s,
            None => return txn.encode_update_v1(),
        };
        if index >= src.len(&txn) {
            log::debug!("move_to_end index {index} out of range, ignored");
            return txn.encode_update_v1();
        }
        let note = match src.get(&txn, index) {
            Some(Out::YMap(m)) if read_kind(&txn, &m) == Some(ItemKind::Note) => m,
            _ => {
                log::debug!("move_to_end target at {index} is not a note, ignored");
                return txn.encode_update_v1();
            }
        };
        let dst = match self.resolve_container(&txn, dest) {
            Some(d) => d,
            None => return txn.encode_update_v1(),
        };

        if source == dest {
            let len = src.len(&txn);
            if index != len - 1 {
                // Append position: the sequence length in pre-move terms.
                src.move_to(&mut txn, index, len);
            }
        } else {
            let snap = match read_note_snapshot(&txn, &note) {
                Some(s) => s,
                None => return txn.encode_update_v1(),
            };
            src.remove(&mut txn, index);
            let len = dst.len(&txn);
            write_note(&mut txn, &dst, len, &snap);
        }
        txn.encode_update_v1()
    }

    /// Create an empty group at the end of the root sequence.
    pub fn add_group(&self, name: &str) -> GroupCreated {
        let mut txn = self.doc().transact_mut();
        let group_id = new_item_id();
        let len = self.items().len(&txn);
        let group: MapRef = self
            .items()
            .insert(&mut txn, len, yrs::MapPrelim::default());
        group.insert(&mut txn, KEY_KIND, KIND_GROUP);
        group.insert(&mut txn, KEY_ID, group_id.to_string());
        group.insert(&mut txn, KEY_NAME, name);
        let _notes: ArrayRef = group.insert(&mut txn, KEY_NOTES, ArrayPrelim::default());
        GroupCreated {
            group_id,
            update: txn.encode_update_v1(),
        }
    }

    /// Rename a group (field-level last-writer-wins, like note text).
    pub fn update_group_name(&self, group_id: Uuid, name: &str) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        match self.locate_group(&txn, group_id) {
            Some(site) => {
                site.group.insert(&mut txn, KEY_NAME, name);
            }
            None => {
                log::debug!("rename of missing group {group_id} ignored");
            }
        }
        txn.encode_update_v1()
    }

    /// Remove a group, preserving its notes by appending them to the root
    /// sequence. Idempotent like [`Board::delete_note`].
    pub fn delete_group(&self, group_id: Uuid) -> Vec<u8> {
        let mut txn = self.doc().transact_mut();
        if let Some(site) = self.locate_group(&txn, group_id) {
            let mut survivors = Vec::new();
            for j in 0..site.notes.len(&txn) {
                if let Some(Out::YMap(m)) = site.notes.get(&txn, j) {
                    if let Some(snap) = read_note_snapshot(&txn, &m) {
                        survivors.push(snap);
                    }
                }
            }
            self.items().remove(&mut txn, site.index);
            for snap in &survivors {
                let len = self.items().len(&txn);
                write_note(&mut txn, self.items(), len, snap);
            }
        } else {
            log::debug!("delete of missing group {group_id} ignored");
        }
        txn.encode_update_v1()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ItemSnapshot;
    use std::collections::HashSet;

    /// Exchange missing updates in both directions.
    fn sync_pair(a: &Board, b: &Board) {
        let for_b = a.encode_diff(&b.state_vector()).unwrap();
        let for_a = b.encode_diff(&a.state_vector()).unwrap();
        b.apply_update(&for_b).unwrap();
        a.apply_update(&for_a).unwrap();
    }

    /// Assert no note/group id appears twice anywhere in the tree.
    fn assert_containment_exclusive(board: &Board) {
        let snap = board.snapshot();
        let mut seen = HashSet::new();
        for item in &snap.items {
            match item {
                ItemSnapshot::Note(n) => {
                    assert!(seen.insert(n.id), "duplicate note {}", n.id);
                }
                ItemSnapshot::Group(g) => {
                    assert!(seen.insert(g.id), "duplicate group {}", g.id);
                    for n in &g.notes {
                        assert!(seen.insert(n.id), "duplicate note {}", n.id);
                    }
                }
            }
        }
    }

    #[test]
    fn test_add_note_appends() {
        let board = Board::new();
        let author = new_item_id();
        let a = board.add_note(ContainerId::Root, "a", author).unwrap();
        let b = board.add_note(ContainerId::Root, "b", author).unwrap();

        let ids = board.snapshot().note_ids();
        assert_eq!(ids, vec![a.note_id, b.note_id]);
    }

    #[test]
    fn test_add_note_into_deleted_group_is_noop() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        board.delete_group(g.group_id);

        assert!(board
            .add_note(ContainerId::Group(g.group_id), "x", author)
            .is_none());
        assert!(board.snapshot().items.is_empty());
    }

    #[test]
    fn test_delete_note_idempotent() {
        let board = Board::new();
        let author = new_item_id();
        let keep = board.add_note(ContainerId::Root, "keep", author).unwrap();
        let gone = board.add_note(ContainerId::Root, "gone", author).unwrap();

        board.delete_note(gone.note_id);
        let once = board.snapshot();
        board.delete_note(gone.note_id); // remote echo
        assert_eq!(board.snapshot(), once);
        assert_eq!(board.snapshot().note_ids(), vec![keep.note_id]);
    }

    #[test]
    fn test_delete_applied_twice_across_replicas() {
        let a = Board::with_client_id(1);
        let b = Board::with_client_id(2);
        let author = new_item_id();
        let n = a.add_note(ContainerId::Root, "n", author).unwrap();
        sync_pair(&a, &b);

        // Both clients race to delete the same note.
        let da = a.delete_note(n.note_id);
        let db = b.delete_note(n.note_id);
        a.apply_update(&db).unwrap();
        b.apply_update(&da).unwrap();

        assert!(a.snapshot().items.is_empty());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_toggle_vote_set_semantics() {
        let board = Board::new();
        let author = new_item_id();
        let client = new_item_id();
        let n = board.add_note(ContainerId::Root, "n", author).unwrap();

        board.toggle_vote(n.note_id, client);
        assert_eq!(board.note(n.note_id).unwrap().votes, vec![client]);

        // Toggling twice restores prior membership.
        board.toggle_vote(n.note_id, client);
        assert!(board.note(n.note_id).unwrap().votes.is_empty());
    }

    #[test]
    fn test_concurrent_votes_by_two_clients_converge() {
        let a = Board::with_client_id(1);
        let b = Board::with_client_id(2);
        let author = new_item_id();
        let alice = new_item_id();
        let bob = new_item_id();
        let n = a.add_note(ContainerId::Root, "n", author).unwrap();
        sync_pair(&a, &b);

        // Each client toggles its own vote, concurrently.
        a.toggle_vote(n.note_id, alice);
        b.toggle_vote(n.note_id, bob);
        sync_pair(&a, &b);

        let votes_a: HashSet<_> = a.note(n.note_id).unwrap().votes.into_iter().collect();
        let votes_b: HashSet<_> = b.note(n.note_id).unwrap().votes.into_iter().collect();
        assert_eq!(votes_a, votes_b);
        assert_eq!(votes_a, HashSet::from([alice, bob]));
    }

    #[test]
    fn test_vote_on_deleted_note_is_noop() {
        let board = Board::new();
        let author = new_item_id();
        let n = board.add_note(ContainerId::Root, "n", author).unwrap();
        board.delete_note(n.note_id);

        // Never an error, nothing observable.
        board.toggle_vote(n.note_id, new_item_id());
        assert!(board.snapshot().items.is_empty());
    }

    #[test]
    fn test_update_text_stamps_last_changed() {
        let board = Board::new();
        let author = new_item_id();
        let n = board.add_note(ContainerId::Root, "old", author).unwrap();
        let before = board.note(n.note_id).unwrap();

        board.update_note_text(n.note_id, "new");
        let after = board.note(n.note_id).unwrap();
        assert_eq!(after.text, "new");
        assert!(after.last_changed >= before.last_changed);
        assert_eq!(after.created, before.created);
    }

    #[test]
    fn test_concurrent_text_edits_last_writer_wins() {
        let a = Board::with_client_id(1);
        let b = Board::with_client_id(2);
        let author = new_item_id();
        let n = a.add_note(ContainerId::Root, "start", author).unwrap();
        sync_pair(&a, &b);

        a.update_note_text(n.note_id, "from-a");
        b.update_note_text(n.note_id, "from-b");
        sync_pair(&a, &b);

        // One full value wins on both sides; no interleaving.
        let text_a = a.note(n.note_id).unwrap().text;
        let text_b = b.note(n.note_id).unwrap().text;
        assert_eq!(text_a, text_b);
        assert!(text_a == "from-a" || text_a == "from-b");
    }

    #[test]
    fn test_move_within_group_reorders() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        let c = ContainerId::Group(g.group_id);
        let n1 = board.add_note(c, "n1", author).unwrap();
        let n2 = board.add_note(c, "n2", author).unwrap();

        board.move_item(n1.note_id, 1, c).unwrap();
        assert_eq!(board.snapshot().note_ids(), vec![n2.note_id, n1.note_id]);
    }

    #[test]
    fn test_move_rightward_over_several_slots() {
        let board = Board::new();
        let author = new_item_id();
        let a = board.add_note(ContainerId::Root, "a", author).unwrap();
        let b = board.add_note(ContainerId::Root, "b", author).unwrap();
        let c = board.add_note(ContainerId::Root, "c", author).unwrap();

        board.move_item(a.note_id, 2, ContainerId::Root).unwrap();
        assert_eq!(
            board.snapshot().note_ids(),
            vec![b.note_id, c.note_id, a.note_id]
        );
    }

    #[test]
    fn test_move_leftward_to_front() {
        let board = Board::new();
        let author = new_item_id();
        let a = board.add_note(ContainerId::Root, "a", author).unwrap();
        let b = board.add_note(ContainerId::Root, "b", author).unwrap();
        let c = board.add_note(ContainerId::Root, "c", author).unwrap();

        board.move_item(c.note_id, 0, ContainerId::Root).unwrap();
        assert_eq!(
            board.snapshot().note_ids(),
            vec![c.note_id, a.note_id, b.note_id]
        );
    }

    #[test]
    fn test_move_to_end_within_same_container() {
        let board = Board::new();
        let author = new_item_id();
        let n1 = board.add_note(ContainerId::Root, "n1", author).unwrap();
        let n2 = board.add_note(ContainerId::Root, "n2", author).unwrap();
        let n3 = board.add_note(ContainerId::Root, "n3", author).unwrap();

        board.move_to_end(0, ContainerId::Root, ContainerId::Root);
        assert_eq!(
            board.snapshot().note_ids(),
            vec![n2.note_id, n3.note_id, n1.note_id]
        );
    }

    #[test]
    fn test_move_between_containers_keeps_content() {
        let board = Board::new();
        let author = new_item_id();
        let voter = new_item_id();
        let g = board.add_group("g");
        let n = board
            .add_note(ContainerId::Group(g.group_id), "payload", author)
            .unwrap();
        board.toggle_vote(n.note_id, voter);

        board.move_item(n.note_id, 0, ContainerId::Root).unwrap();

        let moved = board.note(n.note_id).unwrap();
        assert_eq!(moved.text, "payload");
        assert_eq!(moved.votes, vec![voter]);
        assert_eq!(board.container_of(n.note_id), Some(ContainerId::Root));
        assert_containment_exclusive(&board);
    }

    #[test]
    fn test_move_of_deleted_note_is_noop() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        let c = ContainerId::Group(g.group_id);
        let keep = board.add_note(c, "keep", author).unwrap();
        let victim = board.add_note(ContainerId::Root, "victim", author).unwrap();

        board.delete_note(victim.note_id);
        // Must not panic and must leave the target container unchanged.
        board.move_item(victim.note_id, 0, c).unwrap();
        assert_eq!(board.snapshot().note_ids(), vec![keep.note_id]);
    }

    #[test]
    fn test_move_group_inside_group_rejected_before_mutation() {
        let board = Board::new();
        let g1 = board.add_group("g1");
        let g2 = board.add_group("g2");
        let before = board.snapshot();

        let err = board
            .move_item(g1.group_id, 0, ContainerId::Group(g2.group_id))
            .unwrap_err();
        assert!(matches!(err, OpError::InvalidPlacement(_)));
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_move_group_within_root() {
        let board = Board::new();
        let g1 = board.add_group("g1");
        let g2 = board.add_group("g2");

        board.move_item(g1.group_id, 1, ContainerId::Root).unwrap();
        let snap = board.snapshot();
        match (&snap.items[0], &snap.items[1]) {
            (ItemSnapshot::Group(a), ItemSnapshot::Group(b)) => {
                assert_eq!(a.id, g2.group_id);
                assert_eq!(b.id, g1.group_id);
            }
            other => panic!("unexpected items: {other:?}"),
        }
    }

    #[test]
    fn test_move_target_index_clamped() {
        let board = Board::new();
        let author = new_item_id();
        let n1 = board.add_note(ContainerId::Root, "n1", author).unwrap();
        let n2 = board.add_note(ContainerId::Root, "n2", author).unwrap();

        // Far past the end: lands at the last slot instead of panicking.
        board.move_item(n1.note_id, 99, ContainerId::Root).unwrap();
        assert_eq!(board.snapshot().note_ids(), vec![n2.note_id, n1.note_id]);
    }

    #[test]
    fn test_move_to_end_appends_across_containers() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        let c = ContainerId::Group(g.group_id);
        let loose = board.add_note(ContainerId::Root, "loose", author).unwrap();
        let grouped = board.add_note(c, "grouped", author).unwrap();

        // Root index of the loose note is 1 (after the group).
        board.move_to_end(1, ContainerId::Root, c);
        assert_eq!(
            board.snapshot().note_ids(),
            vec![grouped.note_id, loose.note_id]
        );
        assert_eq!(board.container_of(loose.note_id), Some(c));
    }

    #[test]
    fn test_move_to_end_out_of_range_is_noop() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        let n = board.add_note(ContainerId::Root, "n", author).unwrap();
        let before = board.snapshot();

        // Concurrent structural change left the captured index dangling.
        board.move_to_end(7, ContainerId::Root, ContainerId::Group(g.group_id));
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.container_of(n.note_id), Some(ContainerId::Root));
    }

    #[test]
    fn test_move_to_end_on_group_occupant_is_noop() {
        let board = Board::new();
        let g1 = board.add_group("g1");
        let g2 = board.add_group("g2");
        let before = board.snapshot();

        // Index 0 holds a group; only notes are appended by this operation.
        board.move_to_end(0, ContainerId::Root, ContainerId::Group(g2.group_id));
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.kind_of(g1.group_id), Some(ItemKind::Group));
    }

    #[test]
    fn test_concurrent_move_and_delete_scenario() {
        // Group G holds [N1, N2]. Client A reorders N1 behind N2 while
        // client B deletes N2: every client must end with G.notes = [N1].
        let a = Board::with_client_id(1);
        let b = Board::with_client_id(2);
        let author = new_item_id();
        let g = a.add_group("G");
        let c = ContainerId::Group(g.group_id);
        let n1 = a.add_note(c, "N1", author).unwrap();
        let n2 = a.add_note(c, "N2", author).unwrap();
        sync_pair(&a, &b);

        a.move_item(n1.note_id, 1, c).unwrap();
        assert_eq!(a.snapshot().note_ids(), vec![n2.note_id, n1.note_id]);
        b.delete_note(n2.note_id);

        sync_pair(&a, &b);
        assert_eq!(a.snapshot().note_ids(), vec![n1.note_id]);
        assert_eq!(a.snapshot(), b.snapshot());
        assert_containment_exclusive(&a);
        assert_containment_exclusive(&b);
    }

    #[test]
    fn test_convergence_under_different_arrival_orders() {
        let a = Board::with_client_id(1);
        let b = Board::with_client_id(2);
        let author = new_item_id();
        let base = a.add_note(ContainerId::Root, "base", author).unwrap();
        sync_pair(&a, &b);

        // Concurrent edits from both sides.
        let ua = a
            .add_note(ContainerId::Root, "from-a", author)
            .unwrap()
            .update;
        let ub1 = b.update_note_text(base.note_id, "edited");
        let ub2 = b.toggle_vote(base.note_id, author);

        // Opposite arrival orders on each side.
        b.apply_update(&ua).unwrap();
        a.apply_update(&ub2).unwrap();
        a.apply_update(&ub1).unwrap();

        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_containment_exclusive_after_add_move_sequences() {
        let board = Board::new();
        let author = new_item_id();
        let g1 = board.add_group("g1");
        let g2 = board.add_group("g2");
        let c1 = ContainerId::Group(g1.group_id);
        let c2 = ContainerId::Group(g2.group_id);

        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(board.add_note(c1, &format!("n{i}"), author).unwrap().note_id);
        }
        board.move_item(ids[0], 0, c2).unwrap();
        board.move_item(ids[1], 0, ContainerId::Root).unwrap();
        board.move_item(ids[2], 1, c1).unwrap();
        board.move_to_end(0, c2, c1);

        assert_containment_exclusive(&board);
        let all: HashSet<_> = board.snapshot().note_ids().into_iter().collect();
        assert_eq!(all, ids.iter().copied().collect());
    }

    #[test]
    fn test_group_rename_lww() {
        let board = Board::new();
        let g = board.add_group("old");
        board.update_group_name(g.group_id, "new");
        match &board.snapshot().items[0] {
            ItemSnapshot::Group(grp) => assert_eq!(grp.name, "new"),
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_group_preserves_notes() {
        let board = Board::new();
        let author = new_item_id();
        let g = board.add_group("g");
        let c = ContainerId::Group(g.group_id);
        let n1 = board.add_note(c, "n1", author).unwrap();
        let n2 = board.add_note(c, "n2", author).unwrap();

        board.delete_group(g.group_id);

        // Notes land at the end of the root sequence, order preserved.
        assert_eq!(board.kind_of(g.group_id), None);
        assert_eq!(board.snapshot().note_ids(), vec![n1.note_id, n2.note_id]);
        assert_eq!(board.container_of(n1.note_id), Some(ContainerId::Root));
        board.delete_group(g.group_id); // idempotent
        assert_eq!(board.snapshot().note_ids(), vec![n1.note_id, n2.note_id]);
    }
}
