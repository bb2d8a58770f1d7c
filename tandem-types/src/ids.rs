//! Identifier types used throughout the Tandem core.
//!
//! Peer identifiers are a single byte: every fractional index carries the
//! id of its originating peer as its final byte, so the id space is tied
//! to the key encoding. 0..=255 peers per document is the design limit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a peer (replica) in the sync group.
///
/// A `PeerId` is the trailing byte of every fractional index the peer
/// mints, which is what disambiguates concurrent inserts at the same
/// tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(u8);

impl PeerId {
    /// Creates a peer ID from its byte value.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the underlying byte.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }
}

impl From<u8> for PeerId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
