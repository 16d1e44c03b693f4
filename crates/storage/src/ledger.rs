use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filevault_core::{AccountEmail, Aggregate, Entity, FileId, StorageError, StorageResult};
use filevault_events::Event;

use crate::account::Account;
use crate::file::{File, FileStore};
use crate::size::StorageSize;
use crate::tier::Tier;

/// The account ledger: every account, every file, and the rules between them.
///
/// Accounts are kept in creation order (queries and tie-breaks depend on it).
/// Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: Vec<Account>,
    index: HashMap<AccountEmail, usize>,
    files: FileStore,
    version: u64,
}

/// Command: CreateAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub email: AccountEmail,
    pub tier: Tier,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UploadFile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub email: AccountEmail,
    pub file_id: FileId,
    pub name: String,
    pub size: StorageSize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ShareFile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareFile {
    pub owner: AccountEmail,
    pub receiver: AccountEmail,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateFile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFile {
    pub owner: AccountEmail,
    pub updater: AccountEmail,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    CreateAccount(CreateAccount),
    UploadFile(UploadFile),
    ShareFile(ShareFile),
    UpdateFile(UpdateFile),
}

/// Event: AccountCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub email: AccountEmail,
    pub tier: Tier,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FileUploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploaded {
    pub file_id: FileId,
    pub owner: AccountEmail,
    pub name: String,
    pub size: StorageSize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FileShared. `cost` is what the receiver was charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileShared {
    pub file_id: FileId,
    pub owner: AccountEmail,
    pub receiver: AccountEmail,
    pub cost: StorageSize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FileUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdated {
    pub file_id: FileId,
    pub updater: AccountEmail,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    AccountCreated(AccountCreated),
    FileUploaded(FileUploaded),
    FileShared(FileShared),
    FileUpdated(FileUpdated),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::AccountCreated(_) => "storage.account.created",
            LedgerEvent::FileUploaded(_) => "storage.file.uploaded",
            LedgerEvent::FileShared(_) => "storage.file.shared",
            LedgerEvent::FileUpdated(_) => "storage.file.updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::AccountCreated(e) => e.occurred_at,
            LedgerEvent::FileUploaded(e) => e.occurred_at,
            LedgerEvent::FileShared(e) => e.occurred_at,
            LedgerEvent::FileUpdated(e) => e.occurred_at,
        }
    }
}

/// One line of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub name: String,
    pub size: StorageSize,
    /// True for files shared into the account rather than uploaded by it.
    pub received: bool,
}

/// One line of the account listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub email: AccountEmail,
    pub tier: Tier,
}

impl Aggregate for AccountLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = StorageError;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::AccountCreated(e) => {
                self.index.insert(e.email.clone(), self.accounts.len());
                self.accounts.push(Account::new(e.email.clone(), e.tier));
                tracing::debug!(email = %e.email, tier = %e.tier, "account created");
            }
            LedgerEvent::FileUploaded(e) => {
                self.files.insert(File::new(
                    e.file_id,
                    e.name.clone(),
                    e.size,
                    e.owner.clone(),
                ));
                if let Some(owner) = self.account_mut(&e.owner) {
                    owner.charge(e.size);
                    owner.add_owned(e.file_id);
                }
                tracing::debug!(email = %e.owner, file = %e.name, size = %e.size, "file uploaded");
            }
            LedgerEvent::FileShared(e) => {
                if let Some(file) = self.files.get_mut(&e.file_id) {
                    file.mark_shared();
                }
                if let Some(receiver) = self.account_mut(&e.receiver) {
                    receiver.charge(e.cost);
                    receiver.add_received(e.file_id);
                }
                tracing::debug!(
                    email = %e.owner,
                    receiver = %e.receiver,
                    file = %e.file_id,
                    cost = %e.cost,
                    "file shared"
                );
            }
            LedgerEvent::FileUpdated(e) => {
                if let Some(file) = self.files.get_mut(&e.file_id) {
                    file.record_update(e.updater.clone());
                }
                tracing::debug!(email = %e.updater, file = %e.file_id, "file updated");
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::CreateAccount(cmd) => self.handle_create(cmd),
            LedgerCommand::UploadFile(cmd) => self.handle_upload(cmd),
            LedgerCommand::ShareFile(cmd) => self.handle_share(cmd),
            LedgerCommand::UpdateFile(cmd) => self.handle_update(cmd),
        }
    }
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and apply a command, logging the outcome.
    pub fn dispatch(&mut self, command: &LedgerCommand) -> StorageResult<Vec<LedgerEvent>> {
        match filevault_events::execute(self, command) {
            Ok(events) => {
                for event in &events {
                    tracing::debug!(event_type = event.event_type(), "ledger command accepted");
                }
                Ok(events)
            }
            Err(err) => {
                tracing::debug!(code = err.code(), error = %err, ?command, "ledger command rejected");
                Err(err)
            }
        }
    }

    pub fn create_account(&mut self, email: &str, tier: Tier) -> StorageResult<()> {
        self.dispatch(&LedgerCommand::CreateAccount(CreateAccount {
            email: email.into(),
            tier,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Upload a new file; returns its id.
    pub fn upload(&mut self, email: &str, name: &str, size: StorageSize) -> StorageResult<FileId> {
        let file_id = FileId::new();
        self.dispatch(&LedgerCommand::UploadFile(UploadFile {
            email: email.into(),
            file_id,
            name: name.to_string(),
            size,
            occurred_at: Utc::now(),
        }))?;
        Ok(file_id)
    }

    /// Share one of `owner`'s files with `receiver`; returns what the receiver was charged.
    pub fn share(&mut self, owner: &str, receiver: &str, name: &str) -> StorageResult<StorageSize> {
        let events = self.dispatch(&LedgerCommand::ShareFile(ShareFile {
            owner: owner.into(),
            receiver: receiver.into(),
            name: name.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(events
            .iter()
            .find_map(|e| match e {
                LedgerEvent::FileShared(shared) => Some(shared.cost),
                _ => None,
            })
            .unwrap_or(StorageSize::ZERO))
    }

    pub fn update_file(&mut self, owner: &str, updater: &str, name: &str) -> StorageResult<()> {
        self.dispatch(&LedgerCommand::UpdateFile(UpdateFile {
            owner: owner.into(),
            updater: updater.into(),
            name: name.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Email of the account with the least free space. Ties go to the
    /// earliest-created account.
    pub fn least_free_space_account(&self) -> StorageResult<&AccountEmail> {
        let mut accounts = self.accounts.iter();
        let first = accounts.next().ok_or(StorageError::NoAccounts)?;
        let least = accounts.fold(first, |least, account| {
            if account.free_space() < least.free_space() {
                account
            } else {
                least
            }
        });
        Ok(least.email())
    }

    /// Owned files followed by received files, each in the order they arrived.
    pub fn list_files(&self, email: &str) -> StorageResult<Vec<FileListing>> {
        let account = self.require_account(email)?;
        let owned = account.owned_files().iter().map(|id| (id, false));
        let received = account.received_files().iter().map(|id| (id, true));

        Ok(owned
            .chain(received)
            .filter_map(|(id, received)| {
                self.files.get(id).map(|file| FileListing {
                    name: file.name().to_string(),
                    size: file.size(),
                    received,
                })
            })
            .collect())
    }

    pub fn list_all_accounts(&self) -> Vec<AccountSummary> {
        self.accounts
            .iter()
            .map(|account| AccountSummary {
                email: account.email().clone(),
                tier: account.tier(),
            })
            .collect()
    }

    /// Who last updated `name`, looking in the account's own files first and
    /// then in the files shared with it.
    pub fn last_update_info(&self, email: &str, name: &str) -> StorageResult<&AccountEmail> {
        let account = self.require_account(email)?;
        self.find_in(account.owned_files(), name)
            .or_else(|| self.find_in(account.received_files(), name))
            .map(File::last_updated_by)
            .ok_or(StorageError::FileNotFound)
    }

    pub fn account(&self, email: &str) -> Option<&Account> {
        self.index.get(email).map(|&i| &self.accounts[i])
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn file(&self, id: &FileId) -> Option<&File> {
        self.files.get(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn account_mut(&mut self, email: &AccountEmail) -> Option<&mut Account> {
        let i = *self.index.get(email)?;
        self.accounts.get_mut(i)
    }

    fn require_account(&self, email: &str) -> StorageResult<&Account> {
        self.account(email).ok_or(StorageError::AccountNotFound)
    }

    fn find_in(&self, ids: &[FileId], name: &str) -> Option<&File> {
        ids.iter()
            .filter_map(|id| self.files.get(id))
            .find(|file| file.name() == name)
    }

    fn handle_create(&self, cmd: &CreateAccount) -> Result<Vec<LedgerEvent>, StorageError> {
        if self.index.contains_key(&cmd.email) {
            return Err(StorageError::AccountExists);
        }
        Ok(vec![LedgerEvent::AccountCreated(AccountCreated {
            email: cmd.email.clone(),
            tier: cmd.tier,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_upload(&self, cmd: &UploadFile) -> Result<Vec<LedgerEvent>, StorageError> {
        let account = self.require_account(cmd.email.as_str())?;

        if self.files.contains(&cmd.file_id) {
            return Err(StorageError::invariant("file id already in use"));
        }
        if self.find_in(account.owned_files(), &cmd.name).is_some() {
            return Err(StorageError::FileExists);
        }
        if !account.can_fit(cmd.size) {
            return Err(StorageError::CapacityExceeded);
        }

        Ok(vec![LedgerEvent::FileUploaded(FileUploaded {
            file_id: cmd.file_id,
            owner: cmd.email.clone(),
            name: cmd.name.clone(),
            size: cmd.size,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_share(&self, cmd: &ShareFile) -> Result<Vec<LedgerEvent>, StorageError> {
        let owner = self.require_account(cmd.owner.as_str())?;
        let receiver = self.require_account(cmd.receiver.as_str())?;

        let file = self
            .find_in(owner.owned_files(), &cmd.name)
            .ok_or(StorageError::FileNotFound)?;

        if !owner.tier().can_share() {
            return Err(StorageError::SharingNotAllowed);
        }

        // Receivers whose tier pays nothing skip the capacity check entirely.
        let cost = receiver.tier().share_cost(file.size());
        if receiver.tier().share_cost_percent() > 0 && !receiver.can_fit(cost) {
            return Err(StorageError::CapacityExceeded);
        }

        Ok(vec![LedgerEvent::FileShared(FileShared {
            file_id: *file.id(),
            owner: cmd.owner.clone(),
            receiver: cmd.receiver.clone(),
            cost,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateFile) -> Result<Vec<LedgerEvent>, StorageError> {
        let owner = self.require_account(cmd.owner.as_str())?;
        self.require_account(cmd.updater.as_str())?;

        let file = self
            .find_in(owner.owned_files(), &cmd.name)
            .ok_or(StorageError::FileNotFound)?;

        // Any account may update once the file has been shared with anyone.
        if cmd.updater != cmd.owner && !file.is_shared() {
            return Err(StorageError::NotShared);
        }

        Ok(vec![LedgerEvent::FileUpdated(FileUpdated {
            file_id: *file.id(),
            updater: cmd.updater.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn mb(n: u64) -> StorageSize {
        StorageSize::from_megabytes(n)
    }

    fn free(ledger: &AccountLedger, email: &str) -> StorageSize {
        ledger.account(email).unwrap().free_space()
    }

    fn premium_with_file(name: &str, size: u64) -> AccountLedger {
        let mut ledger = AccountLedger::new();
        ledger.create_account("owner@x", Tier::Premium).unwrap();
        ledger.upload("owner@x", name, mb(size)).unwrap();
        ledger
    }

    #[test]
    fn duplicate_account_is_rejected() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Premium).unwrap();
        assert_eq!(
            ledger.create_account("a@x", Tier::Basic),
            Err(StorageError::AccountExists)
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.account("a@x").unwrap().tier(), Tier::Premium);
    }

    #[test]
    fn upload_to_unknown_account_fails() {
        let mut ledger = AccountLedger::new();
        assert_eq!(
            ledger.upload("nobody@x", "a.txt", mb(1)),
            Err(StorageError::AccountNotFound)
        );
    }

    #[test]
    fn duplicate_upload_leaves_free_space_unchanged() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        ledger.upload("a@x", "a.txt", mb(10)).unwrap();

        let err = ledger.upload("a@x", "a.txt", mb(1)).unwrap_err();

        assert_eq!(err, StorageError::FileExists);
        assert_eq!(free(&ledger, "a@x"), mb(2038));
    }

    #[test]
    fn file_exists_is_checked_before_capacity() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        ledger.upload("a@x", "a.txt", mb(10)).unwrap();
        assert_eq!(
            ledger.upload("a@x", "a.txt", mb(999_999)),
            Err(StorageError::FileExists)
        );
    }

    #[test]
    fn upload_may_use_exactly_the_remaining_space() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        ledger.upload("a@x", "all.bin", mb(2048)).unwrap();
        assert_eq!(free(&ledger, "a@x"), StorageSize::ZERO);
        assert_eq!(
            ledger.upload("a@x", "more.bin", mb(1)),
            Err(StorageError::CapacityExceeded)
        );
    }

    #[test]
    fn file_names_are_unique_per_owner_only() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        ledger.create_account("b@x", Tier::Basic).unwrap();
        ledger.upload("a@x", "same.txt", mb(1)).unwrap();
        ledger.upload("b@x", "same.txt", mb(1)).unwrap();
    }

    #[test]
    fn share_checks_accounts_then_file_then_tier() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("basic@x", Tier::Basic).unwrap();
        ledger.create_account("prem@x", Tier::Premium).unwrap();
        ledger.upload("basic@x", "a.txt", mb(10)).unwrap();

        assert_eq!(
            ledger.share("basic@x", "ghost@x", "a.txt"),
            Err(StorageError::AccountNotFound)
        );
        assert_eq!(
            ledger.share("basic@x", "prem@x", "missing.txt"),
            Err(StorageError::FileNotFound)
        );
        assert_eq!(
            ledger.share("basic@x", "prem@x", "a.txt"),
            Err(StorageError::SharingNotAllowed)
        );
    }

    #[test]
    fn share_premium_to_premium_is_free() {
        let mut ledger = premium_with_file("a.txt", 100);
        ledger.create_account("other@x", Tier::Premium).unwrap();

        let cost = ledger.share("owner@x", "other@x", "a.txt").unwrap();

        assert_eq!(cost, StorageSize::ZERO);
        assert_eq!(free(&ledger, "other@x"), mb(5120));
        let listing = ledger.list_files("other@x").unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing[0].received);
    }

    #[test]
    fn premium_receiver_skips_capacity_check() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("owner@x", Tier::Premium).unwrap();
        ledger.create_account("full@x", Tier::Premium).unwrap();
        ledger.upload("owner@x", "big.bin", mb(4000)).unwrap();
        ledger.upload("full@x", "fill.bin", mb(5120)).unwrap();

        ledger.share("owner@x", "full@x", "big.bin").unwrap();

        assert_eq!(free(&ledger, "full@x"), StorageSize::ZERO);
    }

    #[test]
    fn share_to_basic_charges_half() {
        let mut ledger = premium_with_file("a.txt", 101);
        ledger.create_account("b@x", Tier::Basic).unwrap();

        let cost = ledger.share("owner@x", "b@x", "a.txt").unwrap();

        assert_eq!(cost, StorageSize::from_kibibytes(101 * 512));
        assert_eq!(free(&ledger, "b@x").to_string(), "1997.5");
    }

    #[test]
    fn share_to_basic_without_room_fails_without_mutation() {
        let mut ledger = premium_with_file("big.bin", 5000);
        ledger.create_account("b@x", Tier::Basic).unwrap();
        ledger.upload("b@x", "fill.bin", mb(2000)).unwrap();
        let version = ledger.version();

        let err = ledger.share("owner@x", "b@x", "big.bin").unwrap_err();

        assert_eq!(err, StorageError::CapacityExceeded);
        assert_eq!(free(&ledger, "b@x"), mb(48));
        assert_eq!(ledger.version(), version);
        assert!(ledger.list_files("b@x").unwrap().iter().all(|f| !f.received));
        // The failed share must not flag the file as shared either.
        assert_eq!(
            ledger.update_file("owner@x", "b@x", "big.bin"),
            Err(StorageError::NotShared)
        );
    }

    #[test]
    fn owner_can_always_update() {
        let mut ledger = premium_with_file("a.txt", 1);
        ledger.update_file("owner@x", "owner@x", "a.txt").unwrap();
        assert_eq!(
            ledger.last_update_info("owner@x", "a.txt").unwrap().as_str(),
            "owner@x"
        );
    }

    #[test]
    fn non_owner_needs_file_to_be_shared_with_anyone() {
        let mut ledger = premium_with_file("a.txt", 1);
        ledger.create_account("friend@x", Tier::Premium).unwrap();
        ledger.create_account("stranger@x", Tier::Basic).unwrap();

        assert_eq!(
            ledger.update_file("owner@x", "stranger@x", "a.txt"),
            Err(StorageError::NotShared)
        );

        ledger.share("owner@x", "friend@x", "a.txt").unwrap();
        // stranger never received the file but it is now shared
        ledger.update_file("owner@x", "stranger@x", "a.txt").unwrap();

        assert_eq!(
            ledger.last_update_info("friend@x", "a.txt").unwrap().as_str(),
            "stranger@x"
        );
    }

    #[test]
    fn update_requires_both_accounts_and_an_owned_file() {
        let mut ledger = premium_with_file("a.txt", 1);
        assert_eq!(
            ledger.update_file("owner@x", "ghost@x", "a.txt"),
            Err(StorageError::AccountNotFound)
        );
        assert_eq!(
            ledger.update_file("owner@x", "owner@x", "b.txt"),
            Err(StorageError::FileNotFound)
        );
    }

    #[test]
    fn update_is_visible_to_owner_and_receivers() {
        let mut ledger = premium_with_file("a.txt", 10);
        ledger.create_account("r1@x", Tier::Basic).unwrap();
        ledger.create_account("r2@x", Tier::Premium).unwrap();
        ledger.share("owner@x", "r1@x", "a.txt").unwrap();
        ledger.share("owner@x", "r2@x", "a.txt").unwrap();

        ledger.update_file("owner@x", "r2@x", "a.txt").unwrap();

        for email in ["owner@x", "r1@x", "r2@x"] {
            assert_eq!(ledger.last_update_info(email, "a.txt").unwrap().as_str(), "r2@x");
        }
    }

    #[test]
    fn least_free_space_on_empty_ledger() {
        let ledger = AccountLedger::new();
        assert_eq!(ledger.least_free_space_account(), Err(StorageError::NoAccounts));
    }

    #[test]
    fn least_free_space_ties_go_to_first_created() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("first@x", Tier::Basic).unwrap();
        ledger.create_account("second@x", Tier::Basic).unwrap();
        assert_eq!(ledger.least_free_space_account().unwrap().as_str(), "first@x");

        ledger.create_account("prem@x", Tier::Premium).unwrap();
        ledger.upload("prem@x", "big.bin", mb(3072)).unwrap();
        assert_eq!(ledger.least_free_space_account().unwrap().as_str(), "first@x");

        ledger.upload("second@x", "x.bin", mb(1)).unwrap();
        assert_eq!(ledger.least_free_space_account().unwrap().as_str(), "second@x");
    }

    #[test]
    fn list_files_orders_owned_before_received() {
        let mut ledger = premium_with_file("shared.txt", 4);
        ledger.create_account("b@x", Tier::Basic).unwrap();
        ledger.share("owner@x", "b@x", "shared.txt").unwrap();
        ledger.upload("b@x", "mine.txt", mb(2)).unwrap();

        let listing = ledger.list_files("b@x").unwrap();

        assert_eq!(
            listing,
            vec![
                FileListing { name: "mine.txt".into(), size: mb(2), received: false },
                FileListing { name: "shared.txt".into(), size: mb(4), received: true },
            ]
        );
        assert_eq!(ledger.list_files("ghost@x"), Err(StorageError::AccountNotFound));
    }

    #[test]
    fn list_all_accounts_in_creation_order() {
        let mut ledger = AccountLedger::new();
        assert!(ledger.list_all_accounts().is_empty());
        ledger.create_account("z@x", Tier::Premium).unwrap();
        ledger.create_account("a@x", Tier::Basic).unwrap();

        let all = ledger.list_all_accounts();
        assert_eq!(
            all,
            vec![
                AccountSummary { email: "z@x".into(), tier: Tier::Premium },
                AccountSummary { email: "a@x".into(), tier: Tier::Basic },
            ]
        );
    }

    #[test]
    fn last_update_prefers_owned_over_received() {
        let mut ledger = premium_with_file("notes.txt", 1);
        ledger.create_account("b@x", Tier::Premium).unwrap();
        ledger.share("owner@x", "b@x", "notes.txt").unwrap();
        assert_eq!(ledger.last_update_info("b@x", "notes.txt").unwrap().as_str(), "owner@x");

        ledger.upload("b@x", "notes.txt", mb(1)).unwrap();

        assert_eq!(ledger.last_update_info("b@x", "notes.txt").unwrap().as_str(), "b@x");
        assert_eq!(
            ledger.last_update_info("b@x", "other.txt"),
            Err(StorageError::FileNotFound)
        );
        assert_eq!(
            ledger.last_update_info("ghost@x", "notes.txt"),
            Err(StorageError::AccountNotFound)
        );
    }

    #[test]
    fn dispatch_emits_events_and_bumps_version() {
        let mut ledger = AccountLedger::new();
        let events = ledger
            .dispatch(&LedgerCommand::CreateAccount(CreateAccount {
                email: "a@x".into(),
                tier: Tier::Basic,
                occurred_at: Utc::now(),
            }))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "storage.account.created");
        assert_eq!(ledger.version(), 1);
    }

    #[test]
    fn upload_with_explicit_id_is_resolvable() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        let file_id = FileId::new();
        ledger
            .dispatch(&LedgerCommand::UploadFile(UploadFile {
                email: "a@x".into(),
                file_id,
                name: "a.txt".into(),
                size: mb(3),
                occurred_at: Utc::now(),
            }))
            .unwrap();

        let file = ledger.file(&file_id).unwrap();
        assert_eq!(file.name(), "a.txt");
        assert_eq!(ledger.account("a@x").unwrap().owned_files(), &[file_id]);
    }

    #[test]
    fn upload_reusing_a_file_id_is_rejected() {
        let mut ledger = AccountLedger::new();
        ledger.create_account("a@x", Tier::Basic).unwrap();
        ledger.create_account("b@x", Tier::Basic).unwrap();
        let file_id = ledger.upload("a@x", "secret.txt", mb(10)).unwrap();
        let version = ledger.version();

        let err = ledger
            .dispatch(&LedgerCommand::UploadFile(UploadFile {
                email: "b@x".into(),
                file_id,
                name: "mine.txt".into(),
                size: mb(1),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();

        assert!(matches!(err, StorageError::InvariantViolation(_)));
        assert_eq!(ledger.version(), version);
        let file = ledger.file(&file_id).unwrap();
        assert_eq!(file.owner().as_str(), "a@x");
        assert_eq!(file.name(), "secret.txt");
        assert_eq!(file.size(), mb(10));
        assert_eq!(
            ledger.list_files("a@x").unwrap(),
            vec![FileListing { name: "secret.txt".into(), size: mb(10), received: false }]
        );
        assert!(ledger.list_files("b@x").unwrap().is_empty());
        assert_eq!(free(&ledger, "b@x"), mb(2048));
        assert_eq!(ledger.last_update_info("a@x", "secret.txt").unwrap().as_str(), "a@x");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn mutations_log_their_fields() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut ledger = premium_with_file("a.txt", 100);
            ledger.create_account("b@x", Tier::Basic).unwrap();
            ledger.share("owner@x", "b@x", "a.txt").unwrap();
        });

        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("tier=Premium"));
        assert!(out.contains("file=a.txt"));
        assert!(out.contains("size=100"));
        assert!(out.contains("receiver=b@x"));
        assert!(out.contains("cost=50"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Upload { account: usize, name: u8, size: u64 },
        Share { owner: usize, receiver: usize, name: u8 },
        Update { owner: usize, updater: usize, name: u8 },
    }

    const EMAILS: [&str; 4] = ["p1@x", "p2@x", "b1@x", "b2@x"];

    fn seeded_ledger() -> AccountLedger {
        let mut ledger = AccountLedger::new();
        ledger.create_account(EMAILS[0], Tier::Premium).unwrap();
        ledger.create_account(EMAILS[1], Tier::Premium).unwrap();
        ledger.create_account(EMAILS[2], Tier::Basic).unwrap();
        ledger.create_account(EMAILS[3], Tier::Basic).unwrap();
        ledger
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, 0u8..6, 0u64..3000)
                .prop_map(|(account, name, size)| Op::Upload { account, name, size }),
            (0usize..4, 0usize..4, 0u8..6)
                .prop_map(|(owner, receiver, name)| Op::Share { owner, receiver, name }),
            (0usize..4, 0usize..4, 0u8..6)
                .prop_map(|(owner, updater, name)| Op::Update { owner, updater, name }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: free space never increases and never exceeds capacity,
        /// and a rejected operation changes nothing.
        #[test]
        fn free_space_is_monotonic_and_bounded(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut ledger = seeded_ledger();

            for op in ops {
                let before: Vec<StorageSize> = ledger.accounts().map(Account::free_space).collect();
                let version = ledger.version();

                let result = match &op {
                    Op::Upload { account, name, size } => ledger
                        .upload(EMAILS[*account], &format!("f{name}"), mb(*size))
                        .map(|_| ()),
                    Op::Share { owner, receiver, name } => ledger
                        .share(EMAILS[*owner], EMAILS[*receiver], &format!("f{name}"))
                        .map(|_| ()),
                    Op::Update { owner, updater, name } => ledger
                        .update_file(EMAILS[*owner], EMAILS[*updater], &format!("f{name}")),
                };

                let after: Vec<StorageSize> = ledger.accounts().map(Account::free_space).collect();
                for (account, (b, a)) in ledger.accounts().zip(before.iter().zip(&after)) {
                    prop_assert!(a <= b);
                    prop_assert!(*a <= account.capacity());
                }
                if result.is_err() {
                    prop_assert_eq!(&before, &after);
                    prop_assert_eq!(ledger.version(), version);
                }
            }
        }

        /// Property: a Basic receiver pays exactly half, a Premium receiver nothing.
        #[test]
        fn share_cost_matches_receiver_tier(size in 0u64..4000, to_basic in any::<bool>()) {
            let mut ledger = premium_with_file("f.bin", size);
            let tier = if to_basic { Tier::Basic } else { Tier::Premium };
            ledger.create_account("r@x", tier).unwrap();
            let before = free(&ledger, "r@x");

            let result = ledger.share("owner@x", "r@x", "f.bin");

            let half = StorageSize::from_kibibytes(size * 512);
            match tier {
                Tier::Premium => {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(free(&ledger, "r@x"), before);
                }
                Tier::Basic if half <= before => {
                    prop_assert_eq!(result, Ok(half));
                    prop_assert_eq!(free(&ledger, "r@x"), before.saturating_sub(half));
                }
                Tier::Basic => {
                    prop_assert_eq!(result, Err(StorageError::CapacityExceeded));
                    prop_assert_eq!(free(&ledger, "r@x"), before);
                }
            }
        }

        /// Property: a Basic account can never initiate a share of a file it owns.
        #[test]
        fn basic_owner_never_shares(size in 0u64..2048, receiver_premium in any::<bool>()) {
            let mut ledger = AccountLedger::new();
            ledger.create_account("b@x", Tier::Basic).unwrap();
            let tier = if receiver_premium { Tier::Premium } else { Tier::Basic };
            ledger.create_account("r@x", tier).unwrap();
            ledger.upload("b@x", "f.bin", mb(size)).unwrap();

            prop_assert_eq!(
                ledger.share("b@x", "r@x", "f.bin"),
                Err(StorageError::SharingNotAllowed)
            );
        }
    }
}
