//! Storage domain module: accounts, files, sharing and quotas.
//!
//! Pure domain logic only (no IO, no terminal, no persistence). Every mutation
//! goes through [`AccountLedger`] as a command that is validated in full before
//! any state changes.

pub mod account;
pub mod file;
pub mod ledger;
pub mod shared;
pub mod size;
pub mod tier;

pub use account::Account;
pub use file::{File, FileStore};
pub use ledger::{
    AccountCreated, AccountLedger, AccountSummary, CreateAccount, FileListing, FileShared,
    FileUpdated, FileUploaded, LedgerCommand, LedgerEvent, ShareFile, UpdateFile, UploadFile,
};
pub use shared::SharedLedger;
pub use size::{ParseSizeError, StorageSize};
pub use tier::Tier;
