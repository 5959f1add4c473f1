//! Repository port - durable owner -> account table

use crate::domain::result::Result;
use crate::domain::{Account, Identity};

/// Account storage abstraction
///
/// Each method is a single atomic write or read. Implementations (adapters)
/// provide the actual storage; the custody service supplies the
/// serialization of whole operations.
pub trait AccountRepository: Send + Sync {
    /// Look up the account owned by `owner`
    fn find_account(&self, owner: &Identity) -> Result<Option<Account>>;

    /// Store a brand new account
    ///
    /// Fails with `Error::DuplicateAccount` if the owner already has one.
    fn insert_account(&self, account: &Account) -> Result<()>;

    /// Overwrite an existing account record, including its withdrawal slot
    fn update_account(&self, account: &Account) -> Result<()>;

    /// All accounts, ordered by owner
    fn list_accounts(&self) -> Result<Vec<Account>>;
}
