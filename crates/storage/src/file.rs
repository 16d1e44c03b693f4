use std::collections::HashMap;

use filevault_core::{AccountEmail, Entity, FileId};

use crate::size::StorageSize;

/// File metadata. Content is not modeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    id: FileId,
    name: String,
    size: StorageSize,
    owner: AccountEmail,
    shared: bool,
    last_updated_by: AccountEmail,
}

impl File {
    pub(crate) fn new(id: FileId, name: String, size: StorageSize, owner: AccountEmail) -> Self {
        Self {
            id,
            name,
            size,
            last_updated_by: owner.clone(),
            owner,
            shared: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> StorageSize {
        self.size
    }

    pub fn owner(&self) -> &AccountEmail {
        &self.owner
    }

    /// True once the file has been shared at least once. Never reset.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn last_updated_by(&self) -> &AccountEmail {
        &self.last_updated_by
    }

    pub(crate) fn mark_shared(&mut self) {
        self.shared = true;
    }

    pub(crate) fn record_update(&mut self, updater: AccountEmail) {
        self.last_updated_by = updater;
    }
}

impl Entity for File {
    type Id = FileId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Every file in the ledger, keyed by id.
///
/// Accounts hold `FileId`s only; owner and receivers resolve the same entry here.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    files: HashMap<FileId, File>,
}

impl FileStore {
    pub fn get(&self, id: &FileId) -> Option<&File> {
        self.files.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &FileId) -> Option<&mut File> {
        self.files.get_mut(id)
    }

    pub(crate) fn insert(&mut self, file: File) {
        self.files.insert(*file.id(), file);
    }

    pub(crate) fn contains(&self, id: &FileId) -> bool {
        self.files.contains_key(id)
    }
}
