//! Per-peer causal-broadcast replicator.
//!
//! A replicator owns its peer's append-only event log and vector clock,
//! and fans saved events out to subscribers: the owning document, and
//! any peer that connected to it. Delivery is at-least-once; [`seen`]
//! makes incorporation idempotent, which is all convergence needs.
//!
//! The log is receipt-ordered per replicator — two replicators holding
//! the same event set will generally hold it in different list orders.
//! The log is never reordered and never compacted.
//!
//! [`seen`]: Replicator::seen

use crate::Event;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tandem_crdt::{CausalOrder, VectorClock};
use tandem_types::PeerId;
use tracing::debug;

/// Handle for a registered event subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Rc<dyn Fn(&Event<T>, bool)>;

struct Inner<T> {
    peer_id: PeerId,
    clock: VectorClock,
    /// All known events, local and remote, in receipt order.
    log: Vec<Event<T>>,
    /// Count of self-originated events; the next `origin_seq`.
    local_seq: u64,
    /// Highest `origin_seq` incorporated per origin. Dedup fast path.
    progress: HashMap<PeerId, u64>,
    /// Forwarding subscriptions we registered on other replicators.
    connections: HashMap<PeerId, SubscriptionId>,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_subscription: u64,
}

/// Causal-broadcast replicator for one peer.
///
/// The handle is cheap to clone; all clones share the same state. A
/// replicator is single-threaded: cross-peer delivery happens through
/// synchronous subscriber calls, and the embedding application provides
/// any mutual exclusion it needs.
pub struct Replicator<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Replicator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Replicator<T> {
    /// Creates a replicator for a peer, with an empty log and clock.
    #[must_use]
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                peer_id,
                clock: VectorClock::new(),
                log: Vec::new(),
                local_seq: 0,
                progress: HashMap::new(),
                connections: HashMap::new(),
                subscribers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    /// The peer this replicator speaks for.
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        self.inner.borrow().peer_id
    }

    /// Snapshot of the current vector clock.
    #[must_use]
    pub fn clock(&self) -> VectorClock {
        self.inner.borrow().clock.clone()
    }

    /// Snapshot of the full log in receipt order.
    #[must_use]
    pub fn log(&self) -> Vec<Event<T>> {
        self.inner.borrow().log.clone()
    }

    /// Number of logged events.
    #[must_use]
    pub fn log_len(&self) -> usize {
        self.inner.borrow().log.len()
    }

    /// Highest `origin_seq` incorporated from a peer.
    #[must_use]
    pub fn progress(&self, peer_id: PeerId) -> u64 {
        self.inner
            .borrow()
            .progress
            .get(&peer_id)
            .copied()
            .unwrap_or(0)
    }

    /// Returns true if a live-forwarding link from `peer_id` exists.
    #[must_use]
    pub fn is_connected_to(&self, peer_id: PeerId) -> bool {
        self.inner.borrow().connections.contains_key(&peer_id)
    }

    /// Persists a locally originated operation.
    ///
    /// Increments the own clock entry, stamps the event with the new
    /// clock snapshot and the next per-origin sequence number, saves it
    /// (which fans it out to subscribers, the owning document included)
    /// and returns it. Never blocks: propagation to connected peers is
    /// fire-and-forget.
    pub fn persist(&self, payload: T) -> Event<T> {
        let event = {
            let mut inner = self.inner.borrow_mut();
            let origin = inner.peer_id;
            inner.clock.increment(origin);
            inner.local_seq += 1;
            Event {
                origin,
                origin_seq: inner.local_seq,
                version: inner.clock.clone(),
                payload,
            }
        };
        self.save(event.clone(), true);
        event
    }

    /// Incorporates an event: appends it to the log, advances the
    /// per-origin progress, merges the version into the local clock, and
    /// publishes `(event, is_local)` to every subscriber.
    ///
    /// Callers are expected to gate on [`seen`](Replicator::seen);
    /// `save` itself does not deduplicate. State is fully updated before
    /// fan-out, so re-entrant `seen` checks from forwarding loops
    /// already observe the event.
    pub fn save(&self, event: Event<T>, is_local: bool) {
        let subscribers: Vec<Subscriber<T>> = {
            let mut inner = self.inner.borrow_mut();
            let progress = inner.progress.entry(event.origin).or_insert(0);
            if event.origin_seq > *progress {
                *progress = event.origin_seq;
            }
            inner.clock.merge(&event.version);
            debug!(
                peer = %inner.peer_id,
                origin = %event.origin,
                seq = event.origin_seq,
                is_local,
                "event saved"
            );
            inner.log.push(event.clone());
            inner
                .subscribers
                .iter()
                .map(|(_, subscriber)| Rc::clone(subscriber))
                .collect()
        };
        for subscriber in subscribers {
            subscriber(&event, is_local);
        }
    }

    /// Returns true if this replicator has already incorporated the
    /// event.
    ///
    /// Fast path: per-origin progress. Fallback: the local clock
    /// causally dominating the event's version means the event was
    /// subsumed even if it never transited this replicator directly.
    #[must_use]
    pub fn seen(&self, event: &Event<T>) -> bool {
        let inner = self.inner.borrow();
        if inner.progress.get(&event.origin).copied().unwrap_or(0) >= event.origin_seq {
            return true;
        }
        matches!(
            inner.clock.compare(&event.version),
            CausalOrder::After | CausalOrder::Equal
        )
    }

    /// Registers a subscriber for future saved events.
    pub fn subscribe(&self, handler: impl Fn(&Event<T>, bool) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner.subscribers.push((id, Rc::new(handler)));
        id
    }

    /// Removes a subscriber registration. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(sid, _)| *sid != id);
    }

    /// Connects this replicator to `other`, one-directionally: catch up
    /// on `other`'s backlog, then subscribe to its future events.
    /// Bidirectional sync is two `connect` calls, one per side.
    ///
    /// The catch-up pass checks every backlog event against
    /// [`seen`](Replicator::seen): unseen events are saved (and thereby
    /// forwarded onward), already-subsumed ones only advance the
    /// per-origin progress. Connecting twice is idempotent — the second
    /// call registers no duplicate forwarding subscription and the
    /// catch-up pass finds everything seen.
    pub fn connect(&self, other: &Replicator<T>) {
        // Snapshot first: saving may re-enter `other` through its own
        // forwarding subscriptions.
        for event in other.log() {
            if self.seen(&event) {
                let mut inner = self.inner.borrow_mut();
                let progress = inner.progress.entry(event.origin).or_insert(0);
                if event.origin_seq > *progress {
                    *progress = event.origin_seq;
                }
            } else {
                self.save(event, false);
            }
        }

        let other_peer = other.peer_id();
        if self.inner.borrow().connections.contains_key(&other_peer) {
            return;
        }
        // Weak handle: a bidirectional pair of links must not leak.
        let weak = Rc::downgrade(&self.inner);
        let subscription = other.subscribe(move |event, _is_local| {
            if let Some(inner) = weak.upgrade() {
                let receiver = Replicator { inner };
                if !receiver.seen(event) {
                    receiver.save(event.clone(), false);
                }
            }
        });
        self.inner
            .borrow_mut()
            .connections
            .insert(other_peer, subscription);
        debug!(peer = %self.peer_id(), other = %other_peer, "connected");
    }

    /// Tears down the live-forwarding link from `other`, if one exists.
    /// History is untouched; a reciprocal link registered by the other
    /// side needs its own `disconnect` call over there.
    pub fn disconnect(&self, other: &Replicator<T>) {
        let subscription = self
            .inner
            .borrow_mut()
            .connections
            .remove(&other.peer_id());
        if let Some(id) = subscription {
            other.unsubscribe(id);
            debug!(peer = %self.peer_id(), other = %other.peer_id(), "disconnected");
        }
    }
}
