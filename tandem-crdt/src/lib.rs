//! CRDT building blocks for Tandem.
//!
//! This crate provides the pure, replication-agnostic pieces of the
//! sequence CRDT:
//!
//! - [`FractionalIndex`] — densely orderable, peer-tagged position keys
//! - [`VectorClock`] — causality tracking across peers
//! - [`Lseq`] — the compressed linear sequence itself: a sorted
//!   collection of value chunks and delete tombstones keyed by
//!   fractional index
//!
//! Everything here is deterministic, single-threaded state. Two replicas
//! that apply the same set of [`Op`]s — in any order that respects
//! per-origin causality — converge to identical sequences. Delivering
//! operations in such an order (and exactly once) is the job of the
//! replication layer, not this crate.

mod fractional_index;
mod lseq;
mod vector_clock;

pub use fractional_index::FractionalIndex;
pub use lseq::{Entry, EntryContent, Lseq, LseqError, Op};
pub use vector_clock::{CausalOrder, VectorClock};
