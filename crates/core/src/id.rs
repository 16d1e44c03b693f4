//! Strongly-typed identifiers used across the domain.

use core::borrow::Borrow;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a stored file.
///
/// Files are shared by reference: the owner and every receiver hold the same
/// `FileId`, so an update is visible from all of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for FileId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Identifier of an account: the email it was registered with.
///
/// Compared verbatim; no normalization or format validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountEmail(String);

impl AccountEmail {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountEmail {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountEmail {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AccountEmail {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for AccountEmail {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AccountEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
