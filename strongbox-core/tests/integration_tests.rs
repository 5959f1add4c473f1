//! End-to-end custody scenarios against a DuckDB file
//!
//! Run with: cargo test --test integration_tests

use std::sync::Arc;

use tempfile::TempDir;

use strongbox_core::adapters::clock::ManualClock;
use strongbox_core::{
    Amount, Error, Identity, PayoutKind, StrongboxContext, WithdrawalStatus,
};

const HOUR: i64 = 60 * 60;
const T0: i64 = 1_700_000_000;

fn ether(units: &str) -> Amount {
    Amount::parse_units(units, 18).unwrap()
}

fn id(s: &str) -> Identity {
    Identity::new(s).unwrap()
}

struct Fixture {
    _dir: TempDir,
    ctx: StrongboxContext,
    clock: Arc<ManualClock>,
    owner: Identity,
    backup: Identity,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let ctx = StrongboxContext::with_clock(dir.path(), clock.clone()).unwrap();
    Fixture {
        _dir: dir,
        ctx,
        clock,
        owner: id("0xowner"),
        backup: id("0xbackup"),
    }
}

fn funded() -> Fixture {
    let f = fixture();
    let custody = &f.ctx.custody_service;
    custody.create_account(&f.owner, f.backup.clone()).unwrap();
    custody.deposit(&f.owner, ether("1")).unwrap();
    f
}

#[test]
fn test_one_account_per_owner() {
    let f = fixture();
    let custody = &f.ctx.custody_service;
    custody.create_account(&f.owner, f.backup.clone()).unwrap();
    let err = custody.create_account(&f.owner, id("0xother")).unwrap_err();
    assert!(matches!(err, Error::DuplicateAccount(_)));

    let details = custody.get_account_details(&f.owner).unwrap();
    assert_eq!(details.backup_address, f.backup);
}

#[test]
fn test_deposit_requires_open_unfrozen_account() {
    let f = fixture();
    let custody = &f.ctx.custody_service;
    assert!(matches!(
        custody.deposit(&f.owner, ether("1")),
        Err(Error::AccountNotFound(_))
    ));

    custody.create_account(&f.owner, f.backup.clone()).unwrap();
    custody.deposit(&f.owner, ether("1")).unwrap();
    assert_eq!(
        custody.get_account_details(&f.owner).unwrap().balance,
        Amount::new(1_000_000_000_000_000_000)
    );

    custody.freeze_account(&f.owner).unwrap();
    assert!(matches!(
        custody.deposit(&f.owner, ether("1")),
        Err(Error::AccountFrozen)
    ));
}

#[test]
fn test_reinitiate_overwrites_and_cancel_keeps_amount() {
    let f = funded();
    let custody = &f.ctx.custody_service;

    custody.initiate_withdrawal(&f.owner, ether("0.1")).unwrap();
    f.clock.advance(5);
    custody.initiate_withdrawal(&f.owner, ether("0.2")).unwrap();

    let slot = custody.get_withdrawal_details(&f.owner).unwrap().unwrap();
    assert_eq!(slot.amount, ether("0.2"));
    assert_eq!(slot.initiated_at, T0 + 5);
    assert_eq!(slot.status, WithdrawalStatus::Pending);

    let cancelled = custody.cancel_withdrawal(&f.owner).unwrap();
    assert_eq!(cancelled.status, WithdrawalStatus::Cancelled);
    assert_eq!(cancelled.status_code, 1);
    assert_eq!(cancelled.amount, ether("0.2"));
}

#[test]
fn test_complete_respects_window() {
    let f = funded();
    let custody = &f.ctx.custody_service;
    custody.initiate_withdrawal(&f.owner, ether("0.2")).unwrap();

    f.clock.set(T0 + 23 * HOUR);
    assert!(matches!(
        custody.complete_withdrawal(&f.owner, ether("0.2")),
        Err(Error::TimelockNotElapsed { .. })
    ));

    f.clock.set(T0 + 72 * HOUR);
    assert!(matches!(
        custody.complete_withdrawal(&f.owner, ether("0.2")),
        Err(Error::TimelockExpired { .. })
    ));

    f.clock.set(T0 + 24 * HOUR);
    let before = custody.get_account_details(&f.owner).unwrap().balance;
    let payout = custody.complete_withdrawal(&f.owner, ether("0.2")).unwrap();
    let after = custody.get_account_details(&f.owner).unwrap().balance;

    assert_eq!(after, before.checked_sub(ether("0.2")).unwrap());
    assert_eq!(payout.recipient, f.owner);
    assert_eq!(payout.kind, PayoutKind::Owner);

    let ledger = f.ctx.repository.get_transfers(Some(&f.owner)).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].id, payout.id);
    assert_eq!(ledger[0].amount, ether("0.2"));
}

#[test]
fn test_complete_at_window_close() {
    let f = funded();
    let custody = &f.ctx.custody_service;
    custody.initiate_withdrawal(&f.owner, ether("0.5")).unwrap();

    f.clock.set(T0 + 48 * HOUR);
    custody.complete_withdrawal(&f.owner, ether("0.5")).unwrap();
    assert_eq!(
        custody.get_withdrawal_details(&f.owner).unwrap().unwrap().status,
        WithdrawalStatus::Completed
    );
}

#[test]
fn test_amount_mismatch_regardless_of_timing() {
    let f = funded();
    let custody = &f.ctx.custody_service;
    custody.initiate_withdrawal(&f.owner, ether("0.2")).unwrap();

    for offset in [0, 24 * HOUR, 36 * HOUR, 72 * HOUR] {
        f.clock.set(T0 + offset);
        assert!(matches!(
            custody.complete_withdrawal(&f.owner, ether("0.3")),
            Err(Error::AmountMismatch { .. })
        ));
    }
    assert_eq!(
        custody.get_account_details(&f.owner).unwrap().balance,
        ether("1")
    );
}

#[test]
fn test_backup_withdrawal_only_when_frozen() {
    let f = funded();
    let custody = &f.ctx.custody_service;

    assert!(matches!(
        custody.withdraw_to_backup(&f.owner, ether("0.4")),
        Err(Error::AccountNotFrozen)
    ));

    custody.freeze_account(&f.owner).unwrap();
    let payout = custody.withdraw_to_backup(&f.owner, ether("0.4")).unwrap();
    assert_eq!(payout.recipient, f.backup);
    assert_eq!(payout.amount, ether("0.4"));
    assert_eq!(
        custody.get_account_details(&f.owner).unwrap().balance,
        ether("0.6")
    );

    assert!(matches!(
        custody.withdraw_to_backup(&f.owner, ether("0.7")),
        Err(Error::InsufficientBalance { .. })
    ));
}

#[test]
fn test_reads_do_not_mutate() {
    let f = funded();
    let custody = &f.ctx.custody_service;
    custody.initiate_withdrawal(&f.owner, ether("0.3")).unwrap();

    let details = custody.get_account_details(&f.owner).unwrap();
    let slot = custody.get_withdrawal_details(&f.owner).unwrap();
    f.clock.advance(HOUR);
    assert_eq!(custody.get_account_details(&f.owner).unwrap(), details);
    assert_eq!(custody.get_withdrawal_details(&f.owner).unwrap(), slot);
}

#[test]
fn test_absent_slot_reads_as_none() {
    let f = funded();
    assert_eq!(
        f.ctx.custody_service.get_withdrawal_details(&f.owner).unwrap(),
        None
    );
}

#[test]
fn test_status_summary() {
    let f = funded();
    let custody = &f.ctx.custody_service;
    custody.create_account(&id("0xsecond"), f.backup.clone()).unwrap();
    custody.deposit(&id("0xsecond"), ether("2.5")).unwrap();
    custody.initiate_withdrawal(&f.owner, ether("0.1")).unwrap();
    custody.freeze_account(&id("0xsecond")).unwrap();

    let status = f.ctx.status_service.get_status().unwrap();
    assert_eq!(status.total_accounts, 2);
    assert_eq!(status.frozen_accounts, 1);
    assert_eq!(status.pending_withdrawals, 1);
    assert_eq!(status.total_custody, ether("3.5"));
}
