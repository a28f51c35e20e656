//! State checksums for reproducibility reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 64-bit checksum computed with XXH3.
///
/// Two routing sessions that end with the same [`Checksum`] over their
/// binding state produced identical routings. Logged at the end of a run so
/// seed-for-seed reproducibility can be confirmed from the log alone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(u64);

impl Checksum {
    /// Computes a checksum from a canonical byte serialization.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(data))
    }

    /// Returns the raw 64-bit value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({:016x})", self.0)
    }
}
