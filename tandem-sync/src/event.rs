//! Replicated events.
//!
//! An event wraps an operation payload with its replication metadata.
//! `(origin, origin_seq)` identifies the operation for all time; the
//! version is a snapshot of the originating replicator's clock taken
//! strictly after incrementing its own counter, so it causally dominates
//! everything the origin had incorporated at persist time.

use crate::{SyncError, SyncResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tandem_crdt::VectorClock;
use tandem_types::PeerId;

/// A logged, replicated operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<T> {
    /// The peer that persisted this event.
    pub origin: PeerId,

    /// 1-based sequence number among the origin's own events.
    pub origin_seq: u64,

    /// The origin's vector clock after self-increment.
    pub version: VectorClock,

    /// The operation payload. The replicator never interprets it.
    pub payload: T,
}

impl<T: Serialize> Event<T> {
    /// Encodes the event as JSON for the transport boundary.
    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string(self).map_err(SyncError::from)
    }
}

impl<T: DeserializeOwned> Event<T> {
    /// Decodes an event received over the transport boundary.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(SyncError::from)
    }
}
