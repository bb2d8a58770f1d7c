//! Core type definitions for Tandem.
//!
//! This crate defines the fundamental types shared by every layer of the
//! sequence CRDT and its replication machinery. Today that is just the
//! peer identifier; domain types (entries, operations, events) live in
//! the crates that own their semantics.

mod ids;

pub use ids::PeerId;
