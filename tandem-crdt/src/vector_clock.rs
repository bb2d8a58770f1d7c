//! Vector clock for causality tracking.
//!
//! A vector clock maps each peer to the number of operations this clock
//! has incorporated from that peer. Comparing two clocks yields a partial
//! order: one may causally precede the other, or neither dominates and
//! the clocks are concurrent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tandem_types::PeerId;

/// Causality relationship between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// First clock happened before second.
    Before,
    /// First clock happened after second.
    After,
    /// Clocks are concurrent (neither happened before the other).
    Concurrent,
    /// Clocks are identical.
    Equal,
}

/// A vector clock: per-peer monotonically increasing counters.
///
/// Counters only increase. Absent peers read as 0. Merging takes the
/// element-wise maximum, which is commutative, associative and
/// idempotent — the properties that let replicas converge under
/// arbitrary delivery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorClock {
    clocks: HashMap<PeerId, u64>,
}

impl VectorClock {
    /// Creates a new empty vector clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clocks: HashMap::new(),
        }
    }

    /// Returns the counter for a peer (0 if not present).
    #[must_use]
    pub fn get(&self, peer_id: &PeerId) -> u64 {
        self.clocks.get(peer_id).copied().unwrap_or(0)
    }

    /// Returns all peers and their counters.
    pub fn peers(&self) -> impl Iterator<Item = (&PeerId, &u64)> {
        self.clocks.iter()
    }

    /// Returns the number of peers in the clock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Returns true if the clock has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Increments the counter for a peer and returns the new value.
    ///
    /// Called when the peer originates a new operation.
    pub fn increment(&mut self, peer_id: PeerId) -> u64 {
        let entry = self.clocks.entry(peer_id).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Merges another vector clock into this one.
    ///
    /// For each peer, keeps the maximum of the two counters.
    pub fn merge(&mut self, other: &Self) {
        for (peer_id, &time) in &other.clocks {
            let entry = self.clocks.entry(*peer_id).or_insert(0);
            if time > *entry {
                *entry = time;
            }
        }
    }

    /// Creates a new clock that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Compares this clock with another to determine causal ordering.
    ///
    /// Scans the union of peers in both clocks, tracking whether either
    /// side dominates anywhere. Both dominating somewhere means the
    /// clocks are concurrent.
    #[must_use]
    pub fn compare(&self, other: &Self) -> CausalOrder {
        let mut self_ahead = false;
        let mut other_ahead = false;

        for (peer_id, &time) in &self.clocks {
            match time.cmp(&other.get(peer_id)) {
                std::cmp::Ordering::Greater => self_ahead = true,
                std::cmp::Ordering::Less => other_ahead = true,
                std::cmp::Ordering::Equal => {}
            }
        }
        for (peer_id, &time) in &other.clocks {
            // Peers missing from self read as 0 and were skipped above.
            if !self.clocks.contains_key(peer_id) && time > 0 {
                other_ahead = true;
            }
        }

        match (self_ahead, other_ahead) {
            (true, true) => CausalOrder::Concurrent,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (false, false) => CausalOrder::Equal,
        }
    }

    /// Returns true if this clock dominates the other (>= for all peers).
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        matches!(self.compare(other), CausalOrder::After | CausalOrder::Equal)
    }

    /// Returns true if this clock is concurrent with the other.
    #[must_use]
    pub fn is_concurrent(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Concurrent
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Equal
    }
}

impl Eq for VectorClock {}
