use filevault_core::{AccountEmail, Entity, FileId};

use crate::size::StorageSize;
use crate::tier::Tier;

/// A storage account.
///
/// `free_space` only ever goes down (uploads and received shares) and never
/// below zero; the ledger checks capacity before charging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    email: AccountEmail,
    tier: Tier,
    free_space: StorageSize,
    owned: Vec<FileId>,
    received: Vec<FileId>,
}

impl Account {
    pub fn new(email: AccountEmail, tier: Tier) -> Self {
        Self {
            email,
            tier,
            free_space: tier.capacity(),
            owned: Vec::new(),
            received: Vec::new(),
        }
    }

    pub fn email(&self) -> &AccountEmail {
        &self.email
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn capacity(&self) -> StorageSize {
        self.tier.capacity()
    }

    pub fn free_space(&self) -> StorageSize {
        self.free_space
    }

    /// Files uploaded by this account, oldest first.
    pub fn owned_files(&self) -> &[FileId] {
        &self.owned
    }

    /// Files shared into this account, oldest first.
    pub fn received_files(&self) -> &[FileId] {
        &self.received
    }

    pub fn can_fit(&self, size: StorageSize) -> bool {
        size <= self.free_space
    }

    pub(crate) fn charge(&mut self, size: StorageSize) {
        debug_assert!(self.can_fit(size), "charge must be validated first");
        self.free_space = self.free_space.saturating_sub(size);
    }

    pub(crate) fn add_owned(&mut self, id: FileId) {
        self.owned.push(id);
    }

    pub(crate) fn add_received(&mut self, id: FileId) {
        self.received.push(id);
    }
}

impl Entity for Account {
    type Id = AccountEmail;

    fn id(&self) -> &Self::Id {
        &self.email
    }
}
