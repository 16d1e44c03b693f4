use core::str::FromStr;

use serde::{Deserialize, Serialize};

use filevault_core::{StorageError, ValueObject};

use crate::size::StorageSize;

/// Account tier. Fixed at creation; decides capacity and sharing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Premium,
}

impl Tier {
    /// Total storage an account of this tier starts with.
    pub const fn capacity(self) -> StorageSize {
        match self {
            Tier::Basic => StorageSize::from_megabytes(2048),
            Tier::Premium => StorageSize::from_megabytes(5120),
        }
    }

    /// Share of a received file's size charged to a receiver of this tier.
    pub const fn share_cost_percent(self) -> u8 {
        match self {
            Tier::Basic => 50,
            Tier::Premium => 0,
        }
    }

    /// Storage charged to a receiver of this tier for a file of `size`.
    pub fn share_cost(self, size: StorageSize) -> StorageSize {
        size.percent(self.share_cost_percent())
    }

    /// Whether an account of this tier may share its files.
    pub const fn can_share(self) -> bool {
        matches!(self, Tier::Premium)
    }
}

impl ValueObject for Tier {}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Tier::Basic => "Basic",
            Tier::Premium => "Premium",
        })
    }
}

impl FromStr for Tier {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            _ => Err(StorageError::invalid_tier(s)),
        }
    }
}
