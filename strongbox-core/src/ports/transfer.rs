//! Value transfer port

use crate::domain::result::Result;
use crate::domain::Payout;

/// Executes the movement of value once the core has authorized and debited it
///
/// The custody service calls this only after the debit has been persisted.
/// An error makes the service restore the prior account state.
pub trait ValueTransfer: Send + Sync {
    fn send(&self, payout: &Payout) -> Result<()>;
}
