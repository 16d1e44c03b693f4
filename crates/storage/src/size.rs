//! Storage sizes.
//!
//! Sizes are entered and displayed in megabytes but kept internally as whole
//! kibibytes, so the half-size charge a Basic receiver pays for an odd-sized
//! file stays exact.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use filevault_core::ValueObject;

const KIB_PER_MB: u64 = 1024;

/// A non-negative amount of storage.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StorageSize(u64);

impl StorageSize {
    pub const ZERO: StorageSize = StorageSize(0);

    pub const fn from_megabytes(mb: u64) -> Self {
        Self(mb.saturating_mul(KIB_PER_MB))
    }

    pub const fn from_kibibytes(kib: u64) -> Self {
        Self(kib)
    }

    pub const fn kibibytes(self) -> u64 {
        self.0
    }

    pub fn as_megabytes(self) -> f64 {
        self.0 as f64 / KIB_PER_MB as f64
    }

    pub fn saturating_sub(self, other: StorageSize) -> StorageSize {
        Self(self.0.saturating_sub(other.0))
    }

    /// `percent`% of this size, rounded down to the kibibyte.
    pub fn percent(self, percent: u8) -> StorageSize {
        let scaled = u128::from(self.0) * u128::from(percent) / 100;
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl ValueObject for StorageSize {}

impl core::fmt::Display for StorageSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0 % KIB_PER_MB == 0 {
            write!(f, "{}", self.0 / KIB_PER_MB)
        } else {
            write!(f, "{}", self.as_megabytes())
        }
    }
}

/// A size argument that is not a whole number of megabytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid size: {0:?}")]
pub struct ParseSizeError(String);

impl FromStr for StorageSize {
    type Err = ParseSizeError;

    /// Parses a whole number of megabytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self::from_megabytes)
            .map_err(|_| ParseSizeError(s.to_string()))
    }
}
