//! Fractional indexes: dense, peer-disambiguated position keys.
//!
//! A fractional index replaces the mutable integer position of a sequence
//! element. It is a growable byte string whose final byte is the id of the
//! originating peer; the preceding bytes form a path in a conceptual
//! unbounded base-256 tree. Between any two distinct indexes another can
//! always be constructed, so existing elements never need renumbering.
//!
//! Ordering is plain lexicographic byte order over the whole string: a
//! shorter index that is a prefix of a longer one sorts first, and the
//! trailing peer byte acts as the tiebreak between concurrent inserts at
//! the same tree position.

use serde::{Deserialize, Serialize};
use std::fmt;
use tandem_types::PeerId;

/// A densely orderable position key for sequence elements.
///
/// Invariants: at least two bytes long (one path byte plus the peer
/// byte); the sentinel bounds [`FractionalIndex::min`] and
/// [`FractionalIndex::max`] are never assigned to real content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FractionalIndex(Vec<u8>);

impl FractionalIndex {
    /// Minimal possible index, used as the lower bound when none exists.
    #[must_use]
    pub fn min() -> Self {
        Self(vec![0, 0])
    }

    /// Maximal possible index, used as the upper bound when none exists.
    #[must_use]
    pub fn max() -> Self {
        Self(vec![255, 0])
    }

    /// Creates an index from raw bytes.
    ///
    /// A well-formed index has at least one path byte followed by the
    /// peer byte. Shorter inputs are a programming error, not a runtime
    /// condition: [`FractionalIndex::create_between`] can never produce
    /// one.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        debug_assert!(bytes.len() >= 2, "fractional index needs path + peer bytes");
        Self(bytes)
    }

    /// Returns the raw bytes, trailing peer byte included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the id of the peer that created this index.
    #[must_use]
    pub fn peer(&self) -> PeerId {
        PeerId::new(self.0[self.0.len() - 1])
    }

    /// Generates an index lexically between `lower` and `upper`.
    ///
    /// `lower` defaults to [`FractionalIndex::min`] and `upper` to
    /// [`FractionalIndex::max`] when absent. The bounds' byte strings are
    /// walked position by position while no free slot exists; exhausted
    /// bounds continue as `0` (lower) and `255` (upper), which is what
    /// guarantees a key can always be placed no matter how often a region
    /// has been subdivided. With `lower_bound` the generated key hugs the
    /// lower bound (`lower[i] + 1`), otherwise the upper (`upper[i] - 1`).
    ///
    /// Returns the key and the `distance`: the number of same-level slots
    /// left between the picked byte and the upper bound. Callers use it to
    /// batch multi-element inserts — a chunk of up to `distance` elements
    /// can be addressed through this single key via [`offset`].
    ///
    /// The returned key is strictly between the bounds; `distance >= 1`
    /// on the `lower_bound` path.
    ///
    /// [`offset`]: FractionalIndex::offset
    #[must_use]
    pub fn create_between(
        peer: PeerId,
        lower: Option<&Self>,
        upper: Option<&Self>,
        lower_bound: bool,
    ) -> (Self, u8) {
        let min = Self::min();
        let max = Self::max();
        let lower = lower.unwrap_or(&min).as_bytes();
        let upper = upper.unwrap_or(&max).as_bytes();
        debug_assert!(lower < upper, "bounds must satisfy lower < upper");

        let mut path = Vec::with_capacity(lower.len() + 2);
        let mut i = 0;
        loop {
            let lo = u16::from(lower.get(i).copied().unwrap_or(0));
            let up = u16::from(upper.get(i).copied().unwrap_or(255));
            if up > lo + 1 {
                let picked = if lower_bound { lo + 1 } else { up - 1 };
                path.push(picked as u8);
                path.push(peer.as_u8());
                return (Self(path), (up - picked) as u8);
            }
            path.push(lo as u8);
            i += 1;
        }
    }

    /// Returns a copy with the last path component increased by `n`.
    ///
    /// This derives the key of the `n`-th element inside a chunk without
    /// registering a new index; the peer byte is untouched.
    #[must_use]
    pub fn offset(&self, n: u8) -> Self {
        let mut bytes = self.0.clone();
        let last_path = bytes.len() - 2;
        bytes[last_path] += n;
        Self(bytes)
    }

    /// If `self` addresses an element inside the chunk rooted at `base`,
    /// returns the element offset.
    ///
    /// Chunk elements share every byte with their root key except the
    /// last path component, so this is the exact inverse of
    /// [`offset`](FractionalIndex::offset). Keys of different lengths or
    /// from different peers are never siblings.
    #[must_use]
    pub fn offset_from(&self, base: &Self) -> Option<u8> {
        if self.0.len() != base.0.len() {
            return None;
        }
        let last_path = self.0.len() - 2;
        if self.0[..last_path] != base.0[..last_path] || self.0[last_path + 1..] != base.0[last_path + 1..] {
            return None;
        }
        self.0[last_path].checked_sub(base.0[last_path])
    }
}

impl fmt::Display for FractionalIndex {
    /// Formats as a dot-separated hex path with a `:peer` suffix,
    /// e.g. `1.a0:7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (path, peer) = self.0.split_at(self.0.len() - 1);
        let mut first = true;
        for byte in path {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{byte:x}")?;
            first = false;
        }
        write!(f, ":{:x}", peer[0])
    }
}
