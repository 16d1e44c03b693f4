//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type StorageResult<T> = Result<T, StorageError>;

/// Domain-level error.
///
/// Every variant is an expected business outcome, never a fault. The `Display`
/// text is the message shown to the user by the command shell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// An account with this email is already registered.
    #[error("Account already exists.")]
    AccountExists,

    /// No account is registered under this email.
    #[error("Account does not exist.")]
    AccountNotFound,

    /// The owner already has a file with this name.
    #[error("File already exists in the account.")]
    FileExists,

    /// The named file is not present where it was looked up.
    #[error("File does not exist.")]
    FileNotFound,

    /// Accepting the file would drive free space below zero.
    #[error("File size exceeds account capacity.")]
    CapacityExceeded,

    /// The sharing account's tier cannot initiate shares.
    #[error("Account does not allow file sharing.")]
    SharingNotAllowed,

    /// A non-owner tried to update a file that was never shared.
    #[error("File not shared.")]
    NotShared,

    /// A query needed at least one account.
    #[error("No accounts.")]
    NoAccounts,

    /// The requested tier is not one of the known tiers.
    #[error("Invalid account type.")]
    InvalidTier(String),

    /// A command would break a ledger invariant (e.g. a reused file id).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl StorageError {
    pub fn invalid_tier(value: impl Into<String>) -> Self {
        Self::InvalidTier(value.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Stable machine-readable code, used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::AccountExists => "account_exists",
            StorageError::AccountNotFound => "account_not_found",
            StorageError::FileExists => "file_exists",
            StorageError::FileNotFound => "file_not_found",
            StorageError::CapacityExceeded => "capacity_exceeded",
            StorageError::SharingNotAllowed => "sharing_not_allowed",
            StorageError::NotShared => "not_shared",
            StorageError::NoAccounts => "no_accounts",
            StorageError::InvalidTier(_) => "invalid_tier",
            StorageError::InvariantViolation(_) => "invariant_violation",
        }
    }
}
