//! Account domain model - the custody state machine
//!
//! Every transition validates all of its preconditions before touching any
//! field, so a rejected call leaves the account exactly as it was.

use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::identity::Identity;
use super::payout::{Payout, PayoutKind};
use super::result::{Error, Result};
use super::withdrawal::{TimelockPolicy, WithdrawalDetails, WithdrawalRecord};

/// A single-owner custody account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Set once at creation
    pub owner: Identity,
    /// Recovery destination, set once at creation
    pub backup_address: Identity,
    pub balance: Amount,
    pub frozen: bool,
    /// Last-writer-wins slot; `None` until the first initiation
    pub pending_withdrawal: Option<WithdrawalRecord>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    /// Open a new empty, unfrozen account
    pub fn open(owner: Identity, backup_address: Identity, now: i64) -> Self {
        Self {
            owner,
            backup_address,
            balance: Amount::ZERO,
            frozen: false,
            pending_withdrawal: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ensure_not_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::AccountFrozen);
        }
        Ok(())
    }

    fn ensure_frozen(&self) -> Result<()> {
        if !self.frozen {
            return Err(Error::AccountNotFrozen);
        }
        Ok(())
    }

    fn ensure_covered(&self, amount: Amount) -> Result<()> {
        if amount > self.balance {
            return Err(Error::InsufficientBalance {
                requested: amount.base_units(),
                available: self.balance.base_units(),
            });
        }
        Ok(())
    }

    /// The slot, if it holds a pending record
    fn active_withdrawal(&self) -> Result<&WithdrawalRecord> {
        self.pending_withdrawal
            .as_ref()
            .filter(|w| w.is_pending())
            .ok_or(Error::NoActivePendingWithdrawal)
    }

    pub fn deposit(&mut self, amount: Amount, now: i64) -> Result<()> {
        self.ensure_not_frozen()?;
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::validation("deposit would overflow the account balance"))?;
        self.balance = balance;
        self.updated_at = now;
        Ok(())
    }

    /// Set the frozen flag. Returns false if it was already set.
    pub fn freeze(&mut self, now: i64) -> bool {
        if self.frozen {
            return false;
        }
        self.frozen = true;
        self.updated_at = now;
        true
    }

    /// Record a new pending withdrawal, replacing whatever occupied the slot
    pub fn initiate_withdrawal(&mut self, amount: Amount, now: i64) -> Result<&WithdrawalRecord> {
        self.ensure_not_frozen()?;
        self.ensure_covered(amount)?;
        self.updated_at = now;
        Ok(self
            .pending_withdrawal
            .insert(WithdrawalRecord::pending(amount, now)))
    }

    /// Pending -> Cancelled; amount and time are kept for inspection
    pub fn cancel_withdrawal(&mut self, now: i64) -> Result<&WithdrawalRecord> {
        self.ensure_not_frozen()?;
        self.active_withdrawal()?;
        let record = self
            .pending_withdrawal
            .as_mut()
            .ok_or(Error::NoActivePendingWithdrawal)?;
        record.cancel()?;
        self.updated_at = now;
        Ok(record)
    }

    /// Pending -> Completed, debiting the balance
    ///
    /// Returns the payout to the owner; the caller hands it to the transfer
    /// collaborator only after persisting this account.
    pub fn complete_withdrawal(
        &mut self,
        amount: Amount,
        now: i64,
        policy: &TimelockPolicy,
    ) -> Result<Payout> {
        self.ensure_not_frozen()?;
        let pending = self.active_withdrawal()?;
        if pending.amount != amount {
            return Err(Error::AmountMismatch {
                requested: amount.base_units(),
                pending: pending.amount.base_units(),
            });
        }
        policy.check(pending.initiated_at, now)?;
        self.ensure_covered(amount)?;
        let balance = self.balance.checked_sub(amount).ok_or(Error::InsufficientBalance {
            requested: amount.base_units(),
            available: self.balance.base_units(),
        })?;

        if let Some(record) = self.pending_withdrawal.as_mut() {
            record.complete()?;
        }
        self.balance = balance;
        self.updated_at = now;
        Ok(Payout::new(
            self.owner.clone(),
            self.owner.clone(),
            amount,
            PayoutKind::Owner,
            now,
        ))
    }

    /// Emergency path: debit immediately and pay the backup address.
    /// The pending slot is left untouched.
    pub fn withdraw_to_backup(&mut self, amount: Amount, now: i64) -> Result<Payout> {
        self.ensure_frozen()?;
        self.ensure_covered(amount)?;
        let balance = self.balance.checked_sub(amount).ok_or(Error::InsufficientBalance {
            requested: amount.base_units(),
            available: self.balance.base_units(),
        })?;
        self.balance = balance;
        self.updated_at = now;
        Ok(Payout::new(
            self.owner.clone(),
            self.backup_address.clone(),
            amount,
            PayoutKind::Backup,
            now,
        ))
    }

    pub fn details(&self) -> AccountDetails {
        AccountDetails {
            backup_address: self.backup_address.clone(),
            frozen: self.frozen,
            balance: self.balance,
        }
    }

    pub fn withdrawal_details(&self) -> Option<WithdrawalDetails> {
        self.pending_withdrawal.as_ref().map(WithdrawalRecord::details)
    }
}

/// Read-only view returned by `get_account_details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub backup_address: Identity,
    pub frozen: bool,
    pub balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WithdrawalStatus;

    const DAY: i64 = 24 * 60 * 60;
    const T0: i64 = 1_700_000_000;

    fn funded(balance: u128) -> Account {
        let mut account = Account::open(
            Identity::new("alice").unwrap(),
            Identity::new("bob").unwrap(),
            T0,
        );
        account.deposit(Amount::new(balance), T0).unwrap();
        account
    }

    #[test]
    fn test_open_defaults() {
        let account = Account::open(
            Identity::new("alice").unwrap(),
            Identity::new("bob").unwrap(),
            T0,
        );
        assert_eq!(account.balance, Amount::ZERO);
        assert!(!account.frozen);
        assert!(account.pending_withdrawal.is_none());
        assert_eq!(account.details().backup_address.as_str(), "bob");
    }

    #[test]
    fn test_deposit_rejected_when_frozen() {
        let mut account = funded(100);
        assert!(account.freeze(T0));
        let before = account.clone();
        assert!(matches!(
            account.deposit(Amount::new(1), T0 + 1),
            Err(Error::AccountFrozen)
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn test_refreeze_is_noop() {
        let mut account = funded(100);
        assert!(account.freeze(T0 + 1));
        assert!(!account.freeze(T0 + 2));
        assert_eq!(account.updated_at, T0 + 1);
    }

    #[test]
    fn test_initiate_overwrites_slot() {
        let mut account = funded(1_000);
        account.initiate_withdrawal(Amount::new(100), T0).unwrap();
        account.cancel_withdrawal(T0 + 1).unwrap();
        account.initiate_withdrawal(Amount::new(200), T0 + 2).unwrap();

        let record = account.pending_withdrawal.as_ref().unwrap();
        assert_eq!(record.amount, Amount::new(200));
        assert_eq!(record.initiated_at, T0 + 2);
        assert_eq!(record.status, WithdrawalStatus::Pending);
    }

    #[test]
    fn test_initiate_bounded_by_balance() {
        let mut account = funded(100);
        assert!(matches!(
            account.initiate_withdrawal(Amount::new(101), T0),
            Err(Error::InsufficientBalance { requested: 101, available: 100 })
        ));
        assert!(account.pending_withdrawal.is_none());
        assert!(account.initiate_withdrawal(Amount::new(100), T0).is_ok());
    }

    #[test]
    fn test_cancel_requires_pending() {
        let mut account = funded(100);
        assert!(matches!(
            account.cancel_withdrawal(T0),
            Err(Error::NoActivePendingWithdrawal)
        ));
        account.initiate_withdrawal(Amount::new(10), T0).unwrap();
        account.cancel_withdrawal(T0).unwrap();
        assert!(matches!(
            account.cancel_withdrawal(T0),
            Err(Error::NoActivePendingWithdrawal)
        ));
    }

    #[test]
    fn test_complete_checks_amount_before_timing() {
        let mut account = funded(1_000);
        account.initiate_withdrawal(Amount::new(200), T0).unwrap();
        assert!(matches!(
            account.complete_withdrawal(Amount::new(100), T0, &TimelockPolicy::default()),
            Err(Error::AmountMismatch { requested: 100, pending: 200 })
        ));
        assert!(matches!(
            account.complete_withdrawal(Amount::new(100), T0 + DAY, &TimelockPolicy::default()),
            Err(Error::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_complete_debits_and_terminates() {
        let mut account = funded(1_000);
        account.initiate_withdrawal(Amount::new(200), T0).unwrap();
        let payout = account
            .complete_withdrawal(Amount::new(200), T0 + DAY, &TimelockPolicy::default())
            .unwrap();

        assert_eq!(account.balance, Amount::new(800));
        assert_eq!(payout.recipient.as_str(), "alice");
        assert_eq!(payout.kind, PayoutKind::Owner);
        assert_eq!(
            account.withdrawal_details().unwrap().status,
            WithdrawalStatus::Completed
        );
        assert!(matches!(
            account.complete_withdrawal(Amount::new(200), T0 + DAY, &TimelockPolicy::default()),
            Err(Error::NoActivePendingWithdrawal)
        ));
    }

    #[test]
    fn test_frozen_blocks_timelock_path() {
        let mut account = funded(1_000);
        account.initiate_withdrawal(Amount::new(100), T0).unwrap();
        account.freeze(T0);
        assert!(matches!(
            account.initiate_withdrawal(Amount::new(1), T0),
            Err(Error::AccountFrozen)
        ));
        assert!(matches!(account.cancel_withdrawal(T0 + DAY), Err(Error::AccountFrozen)));
        assert!(matches!(
            account.complete_withdrawal(Amount::new(100), T0 + DAY, &TimelockPolicy::default()),
            Err(Error::AccountFrozen)
        ));
    }

    #[test]
    fn test_backup_withdrawal() {
        let mut account = funded(1_000);
        account.initiate_withdrawal(Amount::new(100), T0).unwrap();
        assert!(matches!(
            account.withdraw_to_backup(Amount::new(100), T0),
            Err(Error::AccountNotFrozen)
        ));

        account.freeze(T0);
        assert!(matches!(
            account.withdraw_to_backup(Amount::new(1_001), T0),
            Err(Error::InsufficientBalance { .. })
        ));

        let payout = account.withdraw_to_backup(Amount::new(100), T0).unwrap();
        assert_eq!(payout.recipient.as_str(), "bob");
        assert_eq!(payout.kind, PayoutKind::Backup);
        assert_eq!(account.balance, Amount::new(900));
        // slot untouched
        assert_eq!(
            account.withdrawal_details().unwrap().status,
            WithdrawalStatus::Pending
        );
    }
}
