//! Custody service - the operations exposed to account owners
//!
//! Every operation resolves the caller's account first, lets the domain
//! model validate and mutate a copy, persists it in one repository call and,
//! for withdrawals, hands the payout to the transfer collaborator last.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountDetails, Amount, Identity, Payout, TimelockPolicy, WithdrawalDetails,
};
use crate::ports::{AccountRepository, Clock, ValueTransfer};

/// Custody service over injected ports
pub struct CustodyService {
    repository: Arc<dyn AccountRepository>,
    transfer: Arc<dyn ValueTransfer>,
    clock: Arc<dyn Clock>,
    policy: TimelockPolicy,
}

impl CustodyService {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        transfer: Arc<dyn ValueTransfer>,
        clock: Arc<dyn Clock>,
        policy: TimelockPolicy,
    ) -> Self {
        Self {
            repository,
            transfer,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &TimelockPolicy {
        &self.policy
    }

    /// Register a new account for `caller` with a fixed backup address
    pub fn create_account(&self, caller: &Identity, backup_address: Identity) -> Result<Account> {
        let account = Account::open(caller.clone(), backup_address, self.clock.now());
        self.repository
            .insert_account(&account)
            .inspect_err(|e| warn!(kind = e.kind(), "create_account rejected"))?;
        info!(owner = %caller, "account created");
        Ok(account)
    }

    /// Resolve the caller's account
    pub fn get_account(&self, caller: &Identity) -> Result<Account> {
        self.repository
            .find_account(caller)?
            .ok_or_else(|| Error::AccountNotFound(caller.to_string()))
    }

    pub fn deposit(&self, caller: &Identity, amount: Amount) -> Result<Account> {
        self.mutate("deposit", caller, |account, now| account.deposit(amount, now))
    }

    /// Freeze the caller's account. Returns false if it was already frozen.
    pub fn freeze_account(&self, caller: &Identity) -> Result<bool> {
        let mut account = self.get_account(caller)?;
        let changed = account.freeze(self.clock.now());
        if changed {
            self.repository.update_account(&account)?;
            info!(owner = %caller, "account frozen");
        }
        Ok(changed)
    }

    /// Record a pending withdrawal, overwriting the slot
    pub fn initiate_withdrawal(
        &self,
        caller: &Identity,
        amount: Amount,
    ) -> Result<WithdrawalDetails> {
        let account = self.mutate("initiate_withdrawal", caller, |account, now| {
            account.initiate_withdrawal(amount, now).map(|_| ())
        })?;
        Self::slot(&account)
    }

    pub fn cancel_withdrawal(&self, caller: &Identity) -> Result<WithdrawalDetails> {
        let account = self.mutate("cancel_withdrawal", caller, |account, now| {
            account.cancel_withdrawal(now).map(|_| ())
        })?;
        Self::slot(&account)
    }

    /// Complete the pending withdrawal inside the timelock window and pay
    /// the owner
    pub fn complete_withdrawal(&self, caller: &Identity, amount: Amount) -> Result<Payout> {
        let policy = self.policy;
        self.pay_out("complete_withdrawal", caller, |account, now| {
            account.complete_withdrawal(amount, now, &policy)
        })
    }

    /// Emergency withdrawal to the backup address; requires a frozen account
    pub fn withdraw_to_backup(&self, caller: &Identity, amount: Amount) -> Result<Payout> {
        self.pay_out("withdraw_to_backup", caller, |account, now| {
            account.withdraw_to_backup(amount, now)
        })
    }

    pub fn get_account_details(&self, owner: &Identity) -> Result<AccountDetails> {
        Ok(self.get_account(owner)?.details())
    }

    /// The withdrawal slot, `None` if nothing was ever initiated
    pub fn get_withdrawal_details(&self, owner: &Identity) -> Result<Option<WithdrawalDetails>> {
        Ok(self.get_account(owner)?.withdrawal_details())
    }

    fn slot(account: &Account) -> Result<WithdrawalDetails> {
        account
            .withdrawal_details()
            .ok_or(Error::NoActivePendingWithdrawal)
    }

    /// Load, apply `op` and persist. A rejected `op` writes nothing.
    fn mutate<F>(&self, operation: &'static str, caller: &Identity, op: F) -> Result<Account>
    where
        F: FnOnce(&mut Account, i64) -> Result<()>,
    {
        let mut account = self.get_account(caller)?;
        if let Err(e) = op(&mut account, self.clock.now()) {
            warn!(operation, kind = e.kind(), "operation rejected");
            return Err(e);
        }
        self.repository.update_account(&account)?;
        info!(operation, owner = %caller, "operation applied");
        Ok(account)
    }

    /// Debit, persist, then transfer. A failed transfer restores the
    /// previous account state.
    fn pay_out<F>(&self, operation: &'static str, caller: &Identity, op: F) -> Result<Payout>
    where
        F: FnOnce(&mut Account, i64) -> Result<Payout>,
    {
        let before = self.get_account(caller)?;
        let mut account = before.clone();
        let payout = op(&mut account, self.clock.now()).inspect_err(|e| {
            warn!(operation, kind = e.kind(), "operation rejected");
        })?;

        self.repository.update_account(&account)?;

        if let Err(e) = self.transfer.send(&payout) {
            warn!(operation, kind = e.kind(), "transfer failed, restoring account");
            if let Err(restore) = self.repository.update_account(&before) {
                error!(operation, kind = restore.kind(), "failed to restore account");
                return Err(restore);
            }
            return Err(match e {
                Error::Transfer(msg) => Error::Transfer(msg),
                other => Error::Transfer(other.to_string()),
            });
        }

        info!(
            operation,
            owner = %caller,
            recipient = %payout.recipient,
            kind = payout.kind.as_str(),
            "payout executed"
        );
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::{InMemoryRepository, RecordingTransfer};
    use crate::domain::{PayoutKind, WithdrawalStatus};

    const DAY: i64 = 24 * 60 * 60;
    const T0: i64 = 1_700_000_000;

    struct Harness {
        service: CustodyService,
        repo: Arc<InMemoryRepository>,
        transfer: Arc<RecordingTransfer>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryRepository::new());
        let transfer = Arc::new(RecordingTransfer::new());
        let clock = Arc::new(ManualClock::new(T0));
        let service = CustodyService::new(
            repo.clone(),
            transfer.clone(),
            clock.clone(),
            TimelockPolicy::default(),
        );
        Harness {
            service,
            repo,
            transfer,
            clock,
        }
    }

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn funded(h: &Harness, balance: u128) -> Identity {
        let alice = id("alice");
        h.service.create_account(&alice, id("bob")).unwrap();
        h.service.deposit(&alice, Amount::new(balance)).unwrap();
        alice
    }

    #[test]
    fn test_create_is_once_per_owner() {
        let h = harness();
        h.service.create_account(&id("alice"), id("bob")).unwrap();
        assert!(matches!(
            h.service.create_account(&id("alice"), id("carol")),
            Err(Error::DuplicateAccount(_))
        ));
        let details = h.service.get_account_details(&id("alice")).unwrap();
        assert_eq!(details.backup_address, id("bob"));
    }

    #[test]
    fn test_unknown_caller() {
        let h = harness();
        assert!(matches!(
            h.service.deposit(&id("ghost"), Amount::new(1)),
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            h.service.freeze_account(&id("ghost")),
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            h.service.get_withdrawal_details(&id("ghost")),
            Err(Error::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_freeze_reports_change() {
        let h = harness();
        let alice = funded(&h, 10);
        assert!(h.service.freeze_account(&alice).unwrap());
        assert!(!h.service.freeze_account(&alice).unwrap());
        assert!(h.service.get_account_details(&alice).unwrap().frozen);
    }

    #[test]
    fn test_complete_pays_owner_at_window_open() {
        let h = harness();
        let alice = funded(&h, 1_000);
        h.service.initiate_withdrawal(&alice, Amount::new(200)).unwrap();

        h.clock.advance(DAY - 1);
        assert!(matches!(
            h.service.complete_withdrawal(&alice, Amount::new(200)),
            Err(Error::TimelockNotElapsed { remaining_secs: 1 })
        ));

        h.clock.advance(1);
        let payout = h.service.complete_withdrawal(&alice, Amount::new(200)).unwrap();
        assert_eq!(payout.kind, PayoutKind::Owner);
        assert_eq!(h.transfer.received_by(&alice), 200);
        assert_eq!(
            h.service.get_account_details(&alice).unwrap().balance,
            Amount::new(800)
        );
        assert_eq!(
            h.service.get_withdrawal_details(&alice).unwrap().unwrap().status,
            WithdrawalStatus::Completed
        );
    }

    #[test]
    fn test_failed_transfer_leaves_no_mutation() {
        let h = harness();
        let alice = funded(&h, 1_000);
        h.service.freeze_account(&alice).unwrap();
        let before = h.repo.find_account(&alice).unwrap().unwrap();

        h.transfer.set_failure(Some("recipient rejected"));
        assert!(matches!(
            h.service.withdraw_to_backup(&alice, Amount::new(400)),
            Err(Error::Transfer(_))
        ));
        assert_eq!(h.repo.find_account(&alice).unwrap().unwrap(), before);
        assert!(h.transfer.sent().is_empty());

        h.transfer.set_failure(None);
        let payout = h.service.withdraw_to_backup(&alice, Amount::new(400)).unwrap();
        assert_eq!(payout.recipient, id("bob"));
        assert_eq!(h.transfer.received_by(&id("bob")), 400);
    }

    #[test]
    fn test_rejections_write_nothing() {
        let h = harness();
        let alice = funded(&h, 100);
        let before = h.repo.find_account(&alice).unwrap().unwrap();

        h.clock.advance(10);
        assert!(h.service.initiate_withdrawal(&alice, Amount::new(101)).is_err());
        assert!(h.service.cancel_withdrawal(&alice).is_err());
        assert!(h.service.complete_withdrawal(&alice, Amount::new(1)).is_err());
        assert!(h.service.withdraw_to_backup(&alice, Amount::new(1)).is_err());

        assert_eq!(h.repo.find_account(&alice).unwrap().unwrap(), before);
    }
}
