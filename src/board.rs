//! The replicated board document model.
//!
//! The board is a Yrs document whose root is the ordered `"items"` array.
//! Each element is a Yrs map tagged by a `kind` field: a `"note"` (leaf with
//! text, author, votes, timestamps) or a `"group"` (named container holding
//! its own ordered `"notes"` array of note maps). Ordering inside every
//! sequence is display order and is merged by the Yrs list CRDT.
//!
//! Positions (container + index) are never stable across mutations: every
//! lookup re-walks the tree inside a fresh transaction, so callers can hold
//! an id across arbitrary concurrent changes and still resolve the current
//! location — or find that the node is gone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{
    Any, Array, ArrayPrelim, ArrayRef, Doc, Map, MapPrelim, MapRef, Out, ReadTxn, StateVector,
    Transact, TransactionMut, Update,
};

// ───────────────────────────────────────────────────────────────────
// Schema keys
// ───────────────────────────────────────────────────────────────────

pub(crate) const KEY_KIND: &str = "kind";
pub(crate) const KEY_ID: &str = "id";
pub(crate) const KEY_TEXT: &str = "text";
pub(crate) const KEY_AUTHOR: &str = "author";
pub(crate) const KEY_VOTES: &str = "votes";
pub(crate) const KEY_CREATED: &str = "created";
pub(crate) const KEY_LAST_CHANGED: &str = "last_changed";
pub(crate) const KEY_NAME: &str = "name";
pub(crate) const KEY_NOTES: &str = "notes";

pub(crate) const KIND_NOTE: &str = "note";
pub(crate) const KIND_GROUP: &str = "group";

/// What an item id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Note,
    Group,
}

/// Addresses an ordered note container: the board root or a group's notes.
///
/// Containers are addressed by identity, never by position, and re-resolved
/// against the live document at every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerId {
    Root,
    Group(Uuid),
}

/// Board-level errors (malformed remote updates only; structural races are
/// absorbed as no-ops by the operations themselves).
#[derive(Debug, Clone)]
pub enum BoardError {
    InvalidUpdate(String),
    InvalidStateVector(String),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUpdate(e) => write!(f, "invalid update: {e}"),
            Self::InvalidStateVector(e) => write!(f, "invalid state vector: {e}"),
        }
    }
}

impl std::error::Error for BoardError {}

// ───────────────────────────────────────────────────────────────────
// Read model
// ───────────────────────────────────────────────────────────────────

/// Plain value snapshot of a note, for the rendering layer and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSnapshot {
    pub id: Uuid,
    pub text: String,
    pub author: Uuid,
    pub votes: Vec<Uuid>,
    pub created: i64,
    pub last_changed: i64,
}

/// Plain value snapshot of a group and its notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub id: Uuid,
    pub name: String,
    pub notes: Vec<NoteSnapshot>,
}

/// One element of the root items sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSnapshot {
    Note(NoteSnapshot),
    Group(GroupSnapshot),
}

/// Full read-only view of the board in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub items: Vec<ItemSnapshot>,
}

impl BoardSnapshot {
    /// Ids of every note currently reachable, in display order.
    pub fn note_ids(&self) -> Vec<Uuid> {
        let mut out = Vec::new();
        for item in &self.items {
            match item {
                ItemSnapshot::Note(n) => out.push(n.id),
                ItemSnapshot::Group(g) => out.extend(g.notes.iter().map(|n| n.id)),
            }
        }
        out
    }
}

// ───────────────────────────────────────────────────────────────────
// Live navigation handles (crate-internal)
// ───────────────────────────────────────────────────────────────────

/// Current location of a note: its container, index within it, and map ref.
/// Valid only for the transaction it was resolved in.
pub(crate) struct NoteSite {
    pub container: ContainerId,
    pub array: ArrayRef,
    pub index: u32,
    pub note: MapRef,
}

/// Current location of a group within the root items sequence.
pub(crate) struct GroupSite {
    pub index: u32,
    pub group: MapRef,
    pub notes: ArrayRef,
}

// ───────────────────────────────────────────────────────────────────
// Board
// ───────────────────────────────────────────────────────────────────

/// The shared board document: a Yrs doc with the root items sequence.
///
/// Exactly one board exists per document; it is created with an empty items
/// sequence. All mutations go through the operations in [`crate::ops`] —
/// nothing else writes to the tree.
pub struct Board {
    doc: Doc,
    items: ArrayRef,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        let doc = Doc::new();
        let items = doc.get_or_insert_array("items");
        Self { doc, items }
    }

    /// Create with an explicit Yrs client id (deterministic merge order in
    /// tests).
    pub fn with_client_id(client_id: u64) -> Self {
        let doc = Doc::with_client_id(client_id);
        let items = doc.get_or_insert_array("items");
        Self { doc, items }
    }

    pub(crate) fn doc(&self) -> &Doc {
        &self.doc
    }

    pub(crate) fn items(&self) -> &ArrayRef {
        &self.items
    }

    /// Apply an encoded update produced by a remote replica.
    pub fn apply_update(&self, update: &[u8]) -> Result<(), BoardError> {
        let decoded =
            Update::decode_v1(update).map_err(|e| BoardError::InvalidUpdate(e.to_string()))?;
        let mut txn = self.doc.transact_mut();
        let _ = txn.apply_update(decoded);
        Ok(())
    }

    /// Encode this replica's state vector for the sync handshake.
    pub fn state_vector(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.state_vector().encode_v1()
    }

    /// Encode the updates a remote replica is missing, given its state vector.
    pub fn encode_diff(&self, remote_state_vector: &[u8]) -> Result<Vec<u8>, BoardError> {
        let sv = StateVector::decode_v1(remote_state_vector)
            .map_err(|e| BoardError::InvalidStateVector(e.to_string()))?;
        let txn = self.doc.transact();
        Ok(txn.encode_diff_v1(&sv))
    }

    /// Whether the note is currently reachable from the document.
    ///
    /// Selection reads are filtered through this, which is what makes stale
    /// selection entries harmless after a concurrent delete.
    pub fn contains_note(&self, note_id: Uuid) -> bool {
        let txn = self.doc.transact();
        self.locate_note(&txn, note_id).is_some()
    }

    /// Distinguishing predicate: note, group, or absent.
    pub fn kind_of(&self, id: Uuid) -> Option<ItemKind> {
        let txn = self.doc.transact();
        if self.locate_group(&txn, id).is_some() {
            return Some(ItemKind::Group);
        }
        if self.locate_note(&txn, id).is_some() {
            return Some(ItemKind::Note);
        }
        None
    }

    /// Current container of a note, if it exists.
    pub fn container_of(&self, note_id: Uuid) -> Option<ContainerId> {
        let txn = self.doc.transact();
        self.locate_note(&txn, note_id).map(|site| site.container)
    }

    /// Index of a note within its current container, if it exists.
    pub fn index_of(&self, note_id: Uuid) -> Option<u32> {
        let txn = self.doc.transact();
        self.locate_note(&txn, note_id).map(|site| site.index)
    }

    /// Read a single note's current value.
    pub fn note(&self, note_id: Uuid) -> Option<NoteSnapshot> {
        let txn = self.doc.transact();
        let site = self.locate_note(&txn, note_id)?;
        read_note_snapshot(&txn, &site.note)
    }

    /// Full snapshot of the board in display order.
    pub fn snapshot(&self) -> BoardSnapshot {
        let txn = self.doc.transact();
        let mut items = Vec::new();
        for i in 0..self.items.len(&txn) {
            let map = match self.items.get(&txn, i) {
                Some(Out::YMap(m)) => m,
                _ => continue,
            };
            match read_kind(&txn, &map) {
                Some(ItemKind::Note) => {
                    if let Some(n) = read_note_snapshot(&txn, &map) {
                        items.push(ItemSnapshot::Note(n));
                    }
                }
                Some(ItemKind::Group) => {
                    if let Some(g) = read_group_snapshot(&txn, &map) {
                        items.push(ItemSnapshot::Group(g));
                    }
                }
                None => {}
            }
        }
        BoardSnapshot { items }
    }

    /// Resolve a container id to its live array, or `None` if it has been
    /// concurrently deleted.
    pub(crate) fn resolve_container<T: ReadTxn>(
        &self,
        txn: &T,
        container: ContainerId,
    ) -> Option<ArrayRef> {
        match container {
            ContainerId::Root => Some(self.items.clone()),
            ContainerId::Group(id) => self.locate_group(txn, id).map(|site| site.notes),
        }
    }

    /// Find a note anywhere in the tree by id. Positions are re-read on
    /// every call; callers must not cache the result across mutations.
    pub(crate) fn locate_note<T: ReadTxn>(&self, txn: &T, note_id: Uuid) -> Option<NoteSite> {
        let wanted = note_id.to_string();
        for i in 0..self.items.len(txn) {
            let map = match self.items.get(txn, i) {
                Some(Out::YMap(m)) => m,
                _ => continue,
            };
            match read_kind(txn, &map) {
                Some(ItemKind::Note) => {
                    if get_str(txn, &map, KEY_ID).as_deref() == Some(wanted.as_str()) {
                        return Some(NoteSite {
                            container: ContainerId::Root,
                            array: self.items.clone(),
                            index: i,
                            note: map,
                        });
                    }
                }
                Some(ItemKind::Group) => {
                    let group_id = match get_str(txn, &map, KEY_ID)
                        .and_then(|s| Uuid::parse_str(&s).ok())
                    {
                        Some(id) => id,
                        None => continue,
                    };
                    let notes = match notes_array(txn, &map) {
                        Some(a) => a,
                        None => continue,
                    };
                    for j in 0..notes.len(txn) {
                        let note = match notes.get(txn, j) {
                            Some(Out::YMap(m)) => m,
                            _ => continue,
                        };
                        if get_str(txn, &note, KEY_ID).as_deref() == Some(wanted.as_str()) {
                            return Some(NoteSite {
                                container: ContainerId::Group(group_id),
                                array: notes,
                                index: j,
                                note,
                            });
                        }
                    }
                }
                None => {}
            }
        }
        None
    }

    /// Find a group in the root items sequence by id.
    pub(crate) fn locate_group<T: ReadTxn>(&self, txn: &T, group_id: Uuid) -> Option<GroupSite> {
        let wanted = group_id.to_string();
        for i in 0..self.items.len(txn) {
            let map = match self.items.get(txn, i) {
                Some(Out::YMap(m)) => m,
                _ => continue,
            };
            if read_kind(txn, &map) != Some(ItemKind::Group) {
                continue;
            }
            if get_str(txn, &map, KEY_ID).as_deref() != Some(wanted.as_str()) {
                continue;
            }
            let notes = notes_array(txn, &map)?;
            return Some(GroupSite {
                index: i,
                group: map,
                notes,
            });
        }
        None
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────────
// Field access helpers (crate-internal)
// ───────────────────────────────────────────────────────────────────

pub(crate) fn read_kind<T: ReadTxn>(txn: &T, map: &MapRef) -> Option<ItemKind> {
    match map.get(txn, KEY_KIND) {
        Some(Out::Any(Any::String(s))) => match s.as_ref() {
            KIND_NOTE => Some(ItemKind::Note),
            KIND_GROUP => Some(ItemKind::Group),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn get_str<T: ReadTxn>(txn: &T, map: &MapRef, key: &str) -> Option<String> {
    match map.get(txn, key) {
        Some(Out::Any(Any::String(s))) => Some(s.to_string()),
        _ => None,
    }
}

pub(crate) fn get_i64<T: ReadTxn>(txn: &T, map: &MapRef, key: &str) -> Option<i64> {
    match map.get(txn, key) {
        Some(Out::Any(Any::BigInt(n))) => Some(n),
        Some(Out::Any(Any::Number(n))) => Some(n as i64),
        _ => None,
    }
}

pub(crate) fn notes_array<T: ReadTxn>(txn: &T, group: &MapRef) -> Option<ArrayRef> {
    match group.get(txn, KEY_NOTES) {
        Some(Out::YArray(a)) => Some(a),
        _ => None,
    }
}

pub(crate) fn read_note_snapshot<T: ReadTxn>(txn: &T, note: &MapRef) -> Option<NoteSnapshot> {
    let id = Uuid::parse_str(&get_str(txn, note, KEY_ID)?).ok()?;
    let author = get_str(txn, note, KEY_AUTHOR)
        .and_then(|s| Uuid::parse_str(&s).ok())
        .unwrap_or_else(Uuid::nil);
    let mut votes = Vec::new();
    if let Some(Out::YArray(arr)) = note.get(txn, KEY_VOTES) {
        for k in 0..arr.len(txn) {
            if let Some(Out::Any(Any::String(s))) = arr.get(txn, k) {
                if let Ok(v) = Uuid::parse_str(&s) {
                    votes.push(v);
                }
            }
        }
    }
    Some(NoteSnapshot {
        id,
        text: get_str(txn, note, KEY_TEXT).unwrap_or_default(),
        author,
        votes,
        created: get_i64(txn, note, KEY_CREATED).unwrap_or(0),
        last_changed: get_i64(txn, note, KEY_LAST_CHANGED).unwrap_or(0),
    })
}

pub(crate) fn read_group_snapshot<T: ReadTxn>(txn: &T, group: &MapRef) -> Option<GroupSnapshot> {
    let id = Uuid::parse_str(&get_str(txn, group, KEY_ID)?).ok()?;
    let name = get_str(txn, group, KEY_NAME).unwrap_or_default();
    let mut notes = Vec::new();
    if let Some(arr) = notes_array(txn, group) {
        for j in 0..arr.len(txn) {
            if let Some(Out::YMap(m)) = arr.get(txn, j) {
                if let Some(n) = read_note_snapshot(txn, &m) {
                    notes.push(n);
                }
            }
        }
    }
    Some(GroupSnapshot { id, name, notes })
}

/// Materialize a note from a snapshot at `index` of `container`.
///
/// Used when creating notes and when a move crosses containers (the note's
/// content travels under its stable id).
pub(crate) fn write_note(
    txn: &mut TransactionMut,
    container: &ArrayRef,
    index: u32,
    snap: &NoteSnapshot,
) -> MapRef {
    let note: MapRef = container.insert(txn, index, MapPrelim::default());
    note.insert(txn, KEY_KIND, KIND_NOTE);
    note.insert(txn, KEY_ID, snap.id.to_string());
    note.insert(txn, KEY_TEXT, snap.text.as_str());
    note.insert(txn, KEY_AUTHOR, snap.author.to_string());
    note.insert(txn, KEY_CREATED, snap.created);
    note.insert(txn, KEY_LAST_CHANGED, snap.last_changed);
    let votes: ArrayRef = note.insert(txn, KEY_VOTES, ArrayPrelim::default());
    for v in &snap.votes {
        votes.push_back(txn, v.to_string());
    }
    note
}

// ===================================================================
// Tests
// ===================================================================
