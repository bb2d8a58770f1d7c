//! Error types for the replication layer.

use tandem_crdt::LseqError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Applying a replicated operation violated a sequence invariant.
    ///
    /// Not retryable: replaying the same event reproduces the violation.
    #[error(transparent)]
    Apply(#[from] LseqError),

    /// Event (de)serialization at the transport boundary failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
