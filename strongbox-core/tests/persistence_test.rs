//! Durability and data directory locking
//!
//! Run with: cargo test --test persistence_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use strongbox_core::adapters::clock::ManualClock;
use strongbox_core::adapters::lock::DataDirLock;
use strongbox_core::{Amount, Error, Identity, StrongboxContext, WithdrawalStatus};

const T0: i64 = 1_700_000_000;
const THREAD_COUNT: usize = 4;

fn id(s: &str) -> Identity {
    Identity::new(s).unwrap()
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let owner = id("alice");

    {
        let ctx = StrongboxContext::with_clock(dir.path(), clock.clone()).unwrap();
        ctx.custody_service.create_account(&owner, id("bob")).unwrap();
        ctx.custody_service.deposit(&owner, Amount::new(u128::MAX / 2)).unwrap();
        ctx.custody_service
            .initiate_withdrawal(&owner, Amount::new(7))
            .unwrap();
    }

    let ctx = StrongboxContext::with_clock(dir.path(), clock).unwrap();
    let details = ctx.custody_service.get_account_details(&owner).unwrap();
    assert_eq!(details.balance, Amount::new(u128::MAX / 2));
    assert!(!details.frozen);

    let slot = ctx.custody_service.get_withdrawal_details(&owner).unwrap().unwrap();
    assert_eq!(slot.amount, Amount::new(7));
    assert_eq!(slot.initiated_at, T0);
    assert_eq!(slot.status, WithdrawalStatus::Pending);
}

#[test]
fn test_second_context_is_busy() {
    let dir = TempDir::new().unwrap();
    let _held = DataDirLock::try_acquire(dir.path()).unwrap();

    let err = StrongboxContext::new(dir.path()).err().unwrap();
    assert!(matches!(err, Error::Busy(_)));
}

/// Each thread opens its own context and deposits once; the data
/// directory lock serializes them, so no deposit is lost.
#[test]
fn test_contexts_serialize_across_threads() {
    let dir = TempDir::new().unwrap();
    let owner = id("alice");
    {
        let ctx = StrongboxContext::new(dir.path()).unwrap();
        ctx.custody_service.create_account(&owner, id("bob")).unwrap();
    }

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let busy_retries = Arc::new(AtomicUsize::new(0));
    let path = Arc::new(dir.path().to_path_buf());

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let busy_retries = Arc::clone(&busy_retries);
            let path = Arc::clone(&path);
            let owner = owner.clone();
            thread::spawn(move || {
                barrier.wait();
                loop {
                    match StrongboxContext::new(&path) {
                        Ok(ctx) => {
                            ctx.custody_service.deposit(&owner, Amount::new(1)).unwrap();
                            break;
                        }
                        Err(Error::Busy(_)) => {
                            busy_retries.fetch_add(1, Ordering::Relaxed);
                            thread::sleep(Duration::from_millis(20));
                        }
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let ctx = StrongboxContext::new(dir.path()).unwrap();
    assert_eq!(
        ctx.custody_service.get_account_details(&owner).unwrap().balance,
        Amount::new(THREAD_COUNT as u128)
    );
}
