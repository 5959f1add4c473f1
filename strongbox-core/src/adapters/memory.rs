//! In-memory adapters
//!
//! An explicit owned account table and a payout recorder. Used by
//! embedding callers that bring their own durability, and by tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Identity, Payout};
use crate::ports::{AccountRepository, ValueTransfer};

fn poisoned(e: impl std::fmt::Display) -> Error {
    Error::database(format!("Lock poisoned: {}", e))
}

/// Owner -> account table held in memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    accounts: Mutex<BTreeMap<Identity, Account>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, BTreeMap<Identity, Account>>> {
        self.accounts.lock().map_err(poisoned)
    }
}

impl AccountRepository for InMemoryRepository {
    fn find_account(&self, owner: &Identity) -> Result<Option<Account>> {
        Ok(self.table()?.get(owner).cloned())
    }

    fn insert_account(&self, account: &Account) -> Result<()> {
        let mut table = self.table()?;
        if table.contains_key(&account.owner) {
            return Err(Error::DuplicateAccount(account.owner.to_string()));
        }
        table.insert(account.owner.clone(), account.clone());
        Ok(())
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let mut table = self.table()?;
        match table.get_mut(&account.owner) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(Error::AccountNotFound(account.owner.to_string())),
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.table()?.values().cloned().collect())
    }
}

/// Transfer adapter that records every payout, optionally failing on demand
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    sent: Mutex<Vec<Payout>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payouts sent so far, in order
    pub fn sent(&self) -> Vec<Payout> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Total received by `recipient`
    pub fn received_by(&self, recipient: &Identity) -> u128 {
        self.sent()
            .iter()
            .filter(|p| &p.recipient == recipient)
            .map(|p| p.amount.base_units())
            .sum()
    }

    /// Make subsequent sends fail with `reason` (None restores success)
    pub fn set_failure(&self, reason: Option<&str>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = reason.map(str::to_string);
        }
    }
}

impl ValueTransfer for RecordingTransfer {
    fn send(&self, payout: &Payout) -> Result<()> {
        if let Some(reason) = self.fail_with.lock().map_err(poisoned)?.clone() {
            return Err(Error::Transfer(reason));
        }
        self.sent.lock().map_err(poisoned)?.push(payout.clone());
        Ok(())
    }
}
