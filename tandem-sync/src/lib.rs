//! Causal-broadcast replication for the Tandem sequence CRDT.
//!
//! Each peer owns a [`Replicator`]: an append-only operation log, a
//! vector clock, and a set of live connections to other replicators.
//! Persisting an operation stamps it with the origin's clock and fans it
//! out to every connected peer; receiving replicators deduplicate with
//! [`Replicator::seen`] and forward onward, so a fully connected group
//! converges to set-equal logs without central coordination.
//!
//! [`Document`] is the embedding surface: an [`Lseq`] sequence wired to
//! its own replicator, exposing plain index-based editing.
//!
//! # Example
//!
//! ```
//! use tandem_sync::Document;
//! use tandem_types::PeerId;
//!
//! let alice = Document::new(PeerId::new(1));
//! let bob = Document::new(PeerId::new(2));
//! alice.connect(&bob);
//! bob.connect(&alice);
//!
//! alice.insert(0, "hello world").unwrap();
//! assert_eq!(bob.text(), "hello world");
//! ```
//!
//! Transport between physically separate processes is out of scope: a
//! deployment bridges two replicators by shipping saved events (see
//! [`Event::to_json`]) into the remote side's [`Replicator::save`].
//!
//! [`Lseq`]: tandem_crdt::Lseq

mod document;
mod error;
mod event;
mod replicator;

pub use document::Document;
pub use error::{SyncError, SyncResult};
pub use event::Event;
pub use replicator::{Replicator, SubscriptionId};
