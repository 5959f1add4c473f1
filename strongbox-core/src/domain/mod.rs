//! Core domain entities
//!
//! The custody state machine lives here. These are pure data structures
//! with validation logic - no I/O and no clock.

mod account;
pub mod amount;
mod identity;
mod payout;
pub mod result;
pub mod withdrawal;

pub use account::{Account, AccountDetails};
pub use amount::Amount;
pub use identity::Identity;
pub use payout::{Payout, PayoutKind};
pub use withdrawal::{TimelockPolicy, WithdrawalDetails, WithdrawalRecord, WithdrawalStatus};
