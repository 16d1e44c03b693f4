//! Serialized access to one ledger from many callers.

use std::sync::{Arc, Mutex, PoisonError};

use crate::ledger::AccountLedger;

/// Cloneable handle to a single [`AccountLedger`].
///
/// Every operation runs under one lock, so a validate-then-mutate step can
/// never interleave with another caller's.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<AccountLedger>>,
}

impl SharedLedger {
    /// Run `f` with exclusive access to the ledger.
    ///
    /// A poisoned lock is recovered: ledger operations validate before they
    /// mutate, so a panicking caller cannot have left a half-applied change.
    pub fn with<R>(&self, f: impl FnOnce(&mut AccountLedger) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Run a read-only query against the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&AccountLedger) -> R) -> R {
        self.with(|ledger| f(ledger))
    }
}
