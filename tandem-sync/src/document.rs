//! A replicated sequence document.
//!
//! `Document` wires an [`Lseq`] to its own [`Replicator`]: local edits
//! are planned against the sequence, persisted through the replicator,
//! and applied by the same subscription callback that applies remote
//! events — one code path for both, exactly as the operations will
//! replay everywhere else.

use crate::{Event, Replicator, SubscriptionId, SyncResult};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tandem_crdt::{Lseq, LseqError, Op};
use tandem_types::PeerId;
use tracing::error;

/// A collaboratively editable ordered sequence.
///
/// Indexes address visible elements only; tombstoned content is
/// invisible to the public API but retained internally.
pub struct Document {
    replicator: Replicator<Op>,
    state: Rc<RefCell<Lseq>>,
    /// Apply failures from the fan-out path park here; see
    /// [`Document::take_apply_error`].
    apply_error: Rc<RefCell<Option<LseqError>>>,
    #[allow(dead_code)]
    subscription: SubscriptionId,
}

impl Document {
    /// Creates an empty document for a peer.
    #[must_use]
    pub fn new(peer_id: PeerId) -> Self {
        let replicator = Replicator::new(peer_id);
        let state = Rc::new(RefCell::new(Lseq::new(peer_id)));
        let apply_error = Rc::new(RefCell::new(None));

        let apply_state = Rc::clone(&state);
        let apply_slot = Rc::clone(&apply_error);
        let subscription = replicator.subscribe(move |event: &Event<Op>, _is_local| {
            if let Err(e) = apply_state.borrow_mut().apply(&event.payload) {
                // Fan-out has no return channel; surface through the
                // error slot and the log. Retrying would fail the same
                // way, so the event is not re-applied.
                error!(
                    origin = %event.origin,
                    seq = event.origin_seq,
                    error = %e,
                    "failed to apply replicated operation"
                );
                *apply_slot.borrow_mut() = Some(e);
            }
        });

        Self {
            replicator,
            state,
            apply_error,
            subscription,
        }
    }

    /// The peer this document edits as.
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        self.state.borrow().peer_id()
    }

    /// The document's replicator, for direct wiring or inspection.
    #[must_use]
    pub fn replicator(&self) -> &Replicator<Op> {
        &self.replicator
    }

    /// Inserts `content` before the visible element at `index`
    /// (`index == len` appends).
    pub fn insert(&self, index: usize, content: &str) -> SyncResult<()> {
        let ops = self.state.borrow().insert_ops(index, content)?;
        for op in ops {
            self.replicator.persist(op);
        }
        self.check_applied()
    }

    /// Removes `len` visible elements starting at `index`.
    pub fn remove(&self, index: usize, len: usize) -> SyncResult<()> {
        let ops = self.state.borrow().remove_ops(index, len)?;
        for op in ops {
            self.replicator.persist(op);
        }
        self.check_applied()
    }

    /// Returns the visible element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<char> {
        self.state.borrow().get(index)
    }

    /// The visible document content.
    #[must_use]
    pub fn text(&self) -> String {
        self.state.borrow().text()
    }

    /// Number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Returns true if no visible elements remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Number of stored entries, tombstones included.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state.borrow().entries().len()
    }

    /// Connects this document's replicator to another's, one way.
    /// Call on both documents for bidirectional editing.
    pub fn connect(&self, other: &Document) {
        self.replicator.connect(&other.replicator);
    }

    /// Tears down this side's forwarding link from `other`.
    pub fn disconnect(&self, other: &Document) {
        self.replicator.disconnect(&other.replicator);
    }

    /// Drains the last failure recorded while applying a replicated
    /// event, if any.
    ///
    /// Local edits report their own apply failures through
    /// [`insert`](Document::insert)/[`remove`](Document::remove);
    /// failures caused by remote events surface here, since the fan-out
    /// that delivers them has no caller to return to.
    pub fn take_apply_error(&self) -> Option<LseqError> {
        self.apply_error.borrow_mut().take()
    }

    fn check_applied(&self) -> SyncResult<()> {
        match self.take_apply_error() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
