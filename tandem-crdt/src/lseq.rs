//! Compressed linear sequence CRDT (LSeq).
//!
//! The sequence is a sorted collection of entries keyed by
//! [`FractionalIndex`]. An entry is either a live chunk of content or a
//! tombstone recording the length of deleted content. Chunks let one
//! coarse key address a whole run of elements: element `n` of a chunk
//! lives at `key.offset(n)`, and an entry is split whenever a later
//! operation needs to address the middle of its span. Tombstones are
//! never physically removed — their key space must stay addressable for
//! causally-concurrent operations that still reference it.
//!
//! [`Lseq`] is pure state. Local edits are *planned* ([`Lseq::insert_ops`],
//! [`Lseq::remove_ops`]) into [`Op`]s and only change the sequence when
//! applied ([`Lseq::apply`]) — the same code path remote operations take.
//! The replication layer is responsible for delivering each op exactly
//! once and in per-origin causal order; under that discipline replicas
//! applying the same op set converge to identical sequences regardless
//! of interleaving.

use crate::FractionalIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tandem_types::PeerId;
use thiserror::Error;

/// Errors raised by sequence operations.
///
/// Out-of-bounds addressing is recoverable by the caller. The key errors
/// indicate a causal-delivery bug or corrupted state: retrying the same
/// operation will fail the same way, so they must be surfaced, not
/// swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LseqError {
    /// Index beyond the current live length.
    #[error("index {index} out of bounds (length: {len})")]
    OutOfBounds { index: usize, len: usize },

    /// A remote insert carried a key that is already present.
    #[error("insert key already present: {0}")]
    KeyExists(FractionalIndex),

    /// A remote delete referenced a key no entry covers.
    #[error("delete key not found: {0}")]
    KeyNotFound(FractionalIndex),

    /// A delete span could not account for its full length.
    #[error("delete span at {key} expected {expected} elements, accounted {found}")]
    SpanMismatch {
        key: FractionalIndex,
        expected: u32,
        found: u32,
    },
}

/// A sequence operation, the replicated unit of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum Op {
    /// Insert a chunk of content at a freshly minted key.
    Insert {
        key: FractionalIndex,
        value: String,
    },
    /// Tombstone `len` elements starting at `key`.
    Delete { key: FractionalIndex, len: u32 },
}

/// Content of a sequence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryContent {
    /// Live content chunk (non-empty).
    Value(String),
    /// Deleted span; the element count is preserved for key-space
    /// accounting.
    Tombstone(u32),
}

/// One unit of the sequence's sorted storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    key: FractionalIndex,
    content: EntryContent,
}

impl Entry {
    /// The entry's fractional index key.
    #[must_use]
    pub fn key(&self) -> &FractionalIndex {
        &self.key
    }

    /// The live content, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Value(s) => Some(s),
            EntryContent::Tombstone(_) => None,
        }
    }

    /// Returns true if this entry is a delete tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        matches!(self.content, EntryContent::Tombstone(_))
    }

    /// Number of elements this entry spans, tombstoned or not.
    #[must_use]
    pub fn span_len(&self) -> usize {
        match &self.content {
            EntryContent::Value(s) => s.chars().count(),
            EntryContent::Tombstone(n) => *n as usize,
        }
    }

    /// Number of visible elements (0 for tombstones).
    fn live_len(&self) -> usize {
        match &self.content {
            EntryContent::Value(s) => s.chars().count(),
            EntryContent::Tombstone(_) => 0,
        }
    }

    /// Converts live content to a tombstone of the same span.
    fn tombstone(&mut self) {
        if let EntryContent::Value(s) = &self.content {
            self.content = EntryContent::Tombstone(s.chars().count() as u32);
        }
    }
}

/// A compressed linear sequence CRDT.
///
/// Entries are kept sorted ascending by key at all times; keys are never
/// reused or mutated after insertion except by splitting, which
/// preserves order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lseq {
    peer_id: PeerId,
    entries: Vec<Entry>,
}

impl Lseq {
    /// Creates a new empty sequence for a peer.
    #[must_use]
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            entries: Vec::new(),
        }
    }

    /// The peer this replica mints keys for.
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(Entry::live_len).sum()
    }

    /// Returns true if no visible elements remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries in key order, tombstones included.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the element at a visible index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<char> {
        let mut remaining = index;
        for entry in &self.entries {
            if let EntryContent::Value(s) = &entry.content {
                let n = s.chars().count();
                if remaining < n {
                    return s.chars().nth(remaining);
                }
                remaining -= n;
            }
        }
        None
    }

    /// Concatenation of all live content in key order.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if let EntryContent::Value(s) = &entry.content {
                out.push_str(s);
            }
        }
        out
    }

    /// Binary search over entry keys.
    ///
    /// `Ok(i)` if an entry's key equals `key`, otherwise `Err(i)` with
    /// the insertion point — the standard [`slice::binary_search_by`]
    /// contract.
    pub fn search(&self, key: &FractionalIndex) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| entry.key.cmp(key))
    }

    /// Plans the operations for inserting `content` at a visible index.
    ///
    /// The sequence itself is unchanged; the caller persists the returned
    /// ops through its replicator, and they take effect via [`apply`].
    ///
    /// Content whose length exceeds the key-level capacity reported by
    /// [`FractionalIndex::create_between`] is broken into chunks, each
    /// minted against a fresh key with the left bound advanced to the
    /// previous chunk's last element.
    ///
    /// [`apply`]: Lseq::apply
    pub fn insert_ops(&self, index: usize, content: &str) -> Result<Vec<Op>, LseqError> {
        let len = self.len();
        if index > len {
            return Err(LseqError::OutOfBounds { index, len });
        }
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let (mut left, right) = self.bounds_at(index);
        let chars: Vec<char> = content.chars().collect();
        let mut ops = Vec::new();
        let mut pos = 0;
        while pos < chars.len() {
            let (key, distance) = FractionalIndex::create_between(
                self.peer_id,
                left.as_ref(),
                right.as_ref(),
                true,
            );
            let take = (distance as usize).min(chars.len() - pos);
            let value: String = chars[pos..pos + take].iter().collect();
            left = Some(if take > 1 {
                key.offset((take - 1) as u8)
            } else {
                key.clone()
            });
            ops.push(Op::Insert { key, value });
            pos += take;
        }
        Ok(ops)
    }

    /// Plans the operations for removing `len` visible elements starting
    /// at `index`: one `Delete` per affected per-entry span, carrying the
    /// span's element count so replicas can validate their bookkeeping.
    pub fn remove_ops(&self, index: usize, len: usize) -> Result<Vec<Op>, LseqError> {
        let live = self.len();
        if index + len > live {
            return Err(LseqError::OutOfBounds {
                index: index + len,
                len: live,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut ops = Vec::new();
        let mut skip = index;
        let mut remaining = len;
        for entry in &self.entries {
            if remaining == 0 {
                break;
            }
            let visible = entry.live_len();
            if visible == 0 {
                continue;
            }
            if skip >= visible {
                skip -= visible;
                continue;
            }
            let count = (visible - skip).min(remaining);
            let key = if skip > 0 {
                entry.key.offset(skip as u8)
            } else {
                entry.key.clone()
            };
            ops.push(Op::Delete {
                key,
                len: count as u32,
            });
            remaining -= count;
            skip = 0;
        }
        Ok(ops)
    }

    /// Applies an operation, local or remote.
    pub fn apply(&mut self, op: &Op) -> Result<(), LseqError> {
        match op {
            Op::Insert { key, value } => self.apply_insert(key, value),
            Op::Delete { key, len } => self.apply_delete(key, *len),
        }
    }

    /// Finds the `(left, right)` key bounds around a visible index.
    ///
    /// The left bound is the key of the last element of the preceding
    /// entry (tombstones count: their key space is still occupied); the
    /// right bound is the next entry's key. `None` means the MIN/MAX
    /// sentinel.
    fn bounds_at(&self, index: usize) -> (Option<FractionalIndex>, Option<FractionalIndex>) {
        let mut remaining = index;
        let mut left = None;
        for entry in &self.entries {
            let visible = entry.live_len();
            if remaining == 0 {
                return (left, Some(entry.key.clone()));
            }
            if remaining < visible {
                return (
                    Some(entry.key.offset((remaining - 1) as u8)),
                    Some(entry.key.offset(remaining as u8)),
                );
            }
            remaining -= visible;
            let span = entry.span_len();
            left = Some(if span > 1 {
                entry.key.offset((span - 1) as u8)
            } else {
                entry.key.clone()
            });
        }
        (left, None)
    }

    /// Splices a remote insert into the sorted collection.
    ///
    /// The key must be absent — fractional index generation mixes the
    /// origin's peer id into every key and persisting is serialized per
    /// replicator, so a hit means a delivery bug. If the key sorts inside
    /// the preceding entry's span, that entry is split first.
    fn apply_insert(&mut self, key: &FractionalIndex, value: &str) -> Result<(), LseqError> {
        let at = match self.search(key) {
            Ok(_) => return Err(LseqError::KeyExists(key.clone())),
            Err(i) => i,
        };
        if at > 0 {
            let prev = &self.entries[at - 1];
            let span = prev.span_len();
            // prev.key < key, so at least the first element sorts before.
            let mut before = 1;
            while before < span && prev.key.offset(before as u8) < *key {
                before += 1;
            }
            if before < span {
                self.split_entry(at - 1, before);
            }
        }
        self.entries.insert(
            at,
            Entry {
                key: key.clone(),
                content: EntryContent::Value(value.to_string()),
            },
        );
        Ok(())
    }

    /// Tombstones `len` elements starting at `key`.
    ///
    /// The covered elements may have been split across several entries on
    /// this replica, with concurrent inserts interleaved between them;
    /// those are skipped untouched. Entries only partially covered are
    /// split at the span edge.
    fn apply_delete(&mut self, key: &FractionalIndex, len: u32) -> Result<(), LseqError> {
        let len = len as usize;
        if len == 0 {
            return Ok(());
        }
        let mut idx = match self.search(key) {
            Ok(i) => i,
            Err(i) => {
                // The span may start mid-entry if this replica never
                // split at that offset.
                if i == 0 {
                    return Err(LseqError::KeyNotFound(key.clone()));
                }
                let prev = &self.entries[i - 1];
                let delta = key.offset_from(&prev.key);
                let prev_span = prev.span_len();
                match delta {
                    Some(delta) if delta > 0 && (delta as usize) < prev_span => {
                        self.split_entry(i - 1, delta as usize);
                        i
                    }
                    _ => return Err(LseqError::KeyNotFound(key.clone())),
                }
            }
        };

        let mut consumed = 0;
        while consumed < len {
            let Some(entry) = self.entries.get(idx) else {
                return Err(LseqError::SpanMismatch {
                    key: key.clone(),
                    expected: len as u32,
                    found: consumed as u32,
                });
            };
            let delta = match entry.key.offset_from(key) {
                Some(d) => d as usize,
                None => {
                    // Concurrent insert wedged inside the span; not ours.
                    idx += 1;
                    continue;
                }
            };
            if delta != consumed {
                return Err(LseqError::SpanMismatch {
                    key: key.clone(),
                    expected: len as u32,
                    found: consumed as u32,
                });
            }
            let span = entry.span_len();
            let overlap = span.min(len - consumed);
            if overlap < span {
                self.split_entry(idx, overlap);
            }
            self.entries[idx].tombstone();
            consumed += overlap;
            idx += 1;
        }
        Ok(())
    }

    /// Divides entry `i` at element `offset`: the left piece keeps
    /// `[0, offset)`, the right piece gets `[offset, span)` keyed at
    /// `key.offset(offset)`. Order is preserved, no key is re-minted.
    fn split_entry(&mut self, i: usize, offset: usize) {
        debug_assert!(offset > 0 && offset < self.entries[i].span_len());
        let right_key = self.entries[i].key.offset(offset as u8);
        let right_content = match &mut self.entries[i].content {
            EntryContent::Value(s) => {
                let byte = s
                    .char_indices()
                    .nth(offset)
                    .map(|(b, _)| b)
                    .unwrap_or(s.len());
                EntryContent::Value(s.split_off(byte))
            }
            EntryContent::Tombstone(n) => {
                let right = *n - offset as u32;
                *n = offset as u32;
                EntryContent::Tombstone(right)
            }
        };
        self.entries.insert(
            i + 1,
            Entry {
                key: right_key,
                content: right_content,
            },
        );
    }
}

impl fmt::Display for Lseq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
