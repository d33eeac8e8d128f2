//! Change notification bridge over the store's subscription.
//!
//! The rendering layer never watches the tree directly: it attaches a
//! bridge, and the bridge fires once per applied batch of changes — local
//! or remote, with no payload beyond "something under the board changed".
//! All derived state (snapshots, selection predicates) is recomputed from
//! the latest document state, which is why a fired callback carries nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use yrs::{DeepObservable, Subscription};

use crate::board::Board;

/// Live subscription to board changes.
///
/// Dropping the bridge unsubscribes.
pub struct ChangeBridge {
    generation: Arc<AtomicU64>,
    _sub: Subscription,
}

impl ChangeBridge {
    /// Subscribe to the board. `callback` runs synchronously inside every
    /// commit that touched the board subtree.
    pub fn attach<F>(board: &Board, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let generation = Arc::new(AtomicU64::new(0));
        let counter = generation.clone();
        let sub = board.items().observe_deep(move |_txn, _events| {
            counter.fetch_add(1, Ordering::Relaxed);
            callback();
        });
        Self {
            generation,
            _sub: sub,
        }
    }

    /// Number of change batches observed so far. View code can poll this to
    /// skip recomputation when nothing changed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}
