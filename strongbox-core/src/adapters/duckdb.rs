//! DuckDB repository implementation
//!
//! Durable owner -> account table plus the payout ledger. Amounts are
//! stored as UHUGEINT and moved across the driver boundary as decimal
//! strings, since u128 has no native binding.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use duckdb::{params, Connection};
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, Amount, Identity, Payout, PayoutKind, WithdrawalRecord, WithdrawalStatus,
};
use crate::ports::{AccountRepository, ValueTransfer};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str = "owner, backup_address, balance::VARCHAR, frozen,
     withdrawal_amount::VARCHAR, withdrawal_initiated_at, withdrawal_status,
     created_at, updated_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) a DuckDB repository
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when another process still holds the database file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!(
                "Failed to open database after {} retries",
                MAX_RETRIES
            ))
        }))
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs an extension
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // === Account operations ===

    fn row_to_account(row: &duckdb::Row) -> duckdb::Result<AccountRow> {
        // 0: owner, 1: backup_address, 2: balance, 3: frozen,
        // 4: withdrawal_amount, 5: withdrawal_initiated_at, 6: withdrawal_status,
        // 7: created_at, 8: updated_at
        Ok(AccountRow {
            owner: row.get(0)?,
            backup_address: row.get(1)?,
            balance: row.get(2)?,
            frozen: row.get(3)?,
            withdrawal_amount: row.get(4)?,
            withdrawal_initiated_at: row.get(5)?,
            withdrawal_status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_accounts ORDER BY owner",
            ACCOUNT_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_account)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(Account::try_from(row?)?);
        }
        Ok(accounts)
    }

    pub fn get_account(&self, owner: &Identity) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_accounts WHERE owner = ?",
            ACCOUNT_COLUMNS
        ))?;
        let mut rows = stmt.query_map([owner.as_str()], Self::row_to_account)?;
        match rows.next() {
            Some(row) => Ok(Some(Account::try_from(row?)?)),
            None => Ok(None),
        }
    }

    pub fn add_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_accounts WHERE owner = ?",
            [account.owner.as_str()],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(Error::DuplicateAccount(account.owner.to_string()));
        }

        let slot = SlotColumns::from(account);
        let inserted = conn.execute(
            "INSERT INTO sys_accounts (owner, backup_address, balance, frozen,
                                       withdrawal_amount, withdrawal_initiated_at, withdrawal_status,
                                       created_at, updated_at)
             VALUES (?, ?, CAST(? AS UHUGEINT), ?, CAST(? AS UHUGEINT), ?, ?, ?, ?)
             ON CONFLICT (owner) DO NOTHING",
            params![
                account.owner.as_str(),
                account.backup_address.as_str(),
                account.balance.to_string(),
                account.frozen,
                slot.amount,
                slot.initiated_at,
                slot.status,
                account.created_at,
                account.updated_at,
            ],
        )?;
        if inserted == 0 {
            return Err(Error::DuplicateAccount(account.owner.to_string()));
        }
        Ok(())
    }

    /// Overwrite the mutable columns of an account in a single statement
    pub fn save_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;
        let slot = SlotColumns::from(account);
        let updated = conn.execute(
            "UPDATE sys_accounts SET
                balance = CAST(? AS UHUGEINT),
                frozen = ?,
                withdrawal_amount = CAST(? AS UHUGEINT),
                withdrawal_initiated_at = ?,
                withdrawal_status = ?,
                updated_at = ?
             WHERE owner = ?",
            params![
                account.balance.to_string(),
                account.frozen,
                slot.amount,
                slot.initiated_at,
                slot.status,
                account.updated_at,
                account.owner.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(Error::AccountNotFound(account.owner.to_string()));
        }
        Ok(())
    }

    // === Transfer ledger ===

    pub fn add_transfer(&self, payout: &Payout) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_transfers (transfer_id, owner, recipient, amount, kind, executed_at)
             VALUES (?, ?, ?, CAST(? AS UHUGEINT), ?, ?)",
            params![
                payout.id.to_string(),
                payout.owner.as_str(),
                payout.recipient.as_str(),
                payout.amount.to_string(),
                payout.kind.as_str(),
                payout.executed_at,
            ],
        )?;
        Ok(())
    }

    /// Ledger entries, newest first; all owners when `owner` is None
    pub fn get_transfers(&self, owner: Option<&Identity>) -> Result<Vec<Payout>> {
        let conn = self.lock()?;
        let sql = if owner.is_some() {
            "SELECT transfer_id, owner, recipient, amount::VARCHAR, kind, executed_at
             FROM sys_transfers WHERE owner = ? ORDER BY executed_at DESC, transfer_id"
        } else {
            "SELECT transfer_id, owner, recipient, amount::VARCHAR, kind, executed_at
             FROM sys_transfers ORDER BY executed_at DESC, transfer_id"
        };
        let mut stmt = conn.prepare(sql)?;

        let rows: Vec<(String, String, String, String, String, i64)> = match owner {
            Some(o) => stmt
                .query_map([o.as_str()], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                })?
                .collect::<duckdb::Result<_>>()?,
            None => stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                })?
                .collect::<duckdb::Result<_>>()?,
        };

        rows.into_iter()
            .map(|(id, owner, recipient, amount, kind, executed_at)| {
                Ok(Payout {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| Error::database(format!("bad transfer id {}: {}", id, e)))?,
                    owner: Identity::new(&owner)?,
                    recipient: Identity::new(&recipient)?,
                    amount: parse_amount(&amount)?,
                    kind: PayoutKind::parse(&kind)
                        .ok_or_else(|| Error::database(format!("unknown payout kind: {}", kind)))?,
                    executed_at,
                })
            })
            .collect()
    }

    pub fn get_transfer_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_transfers", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn get_db_size(&self) -> Result<u64> {
        let metadata = std::fs::metadata(&self.db_path)?;
        Ok(metadata.len())
    }
}

impl AccountRepository for DuckDbRepository {
    fn find_account(&self, owner: &Identity) -> Result<Option<Account>> {
        self.get_account(owner)
    }

    fn insert_account(&self, account: &Account) -> Result<()> {
        self.add_account(account)
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        self.save_account(account)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get_accounts()
    }
}

/// Ledger-backed transfer: the payout is final once it is recorded
impl ValueTransfer for DuckDbRepository {
    fn send(&self, payout: &Payout) -> Result<()> {
        self.add_transfer(payout)
    }
}

/// Raw sys_accounts row as read from the driver
struct AccountRow {
    owner: String,
    backup_address: String,
    balance: String,
    frozen: bool,
    withdrawal_amount: Option<String>,
    withdrawal_initiated_at: Option<i64>,
    withdrawal_status: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        let pending_withdrawal = match (
            row.withdrawal_amount,
            row.withdrawal_initiated_at,
            row.withdrawal_status,
        ) {
            (Some(amount), Some(initiated_at), Some(status)) => Some(WithdrawalRecord {
                amount: parse_amount(&amount)?,
                initiated_at,
                status: WithdrawalStatus::parse(&status).ok_or_else(|| {
                    Error::database(format!("unknown withdrawal status: {}", status))
                })?,
            }),
            (None, None, None) => None,
            _ => {
                return Err(Error::database(format!(
                    "partial withdrawal slot for owner {}",
                    row.owner
                )))
            }
        };

        Ok(Account {
            owner: Identity::new(&row.owner)?,
            backup_address: Identity::new(&row.backup_address)?,
            balance: parse_amount(&row.balance)?,
            frozen: row.frozen,
            pending_withdrawal,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Withdrawal slot flattened into nullable columns
struct SlotColumns {
    amount: Option<String>,
    initiated_at: Option<i64>,
    status: Option<&'static str>,
}

impl From<&Account> for SlotColumns {
    fn from(account: &Account) -> Self {
        match &account.pending_withdrawal {
            Some(w) => Self {
                amount: Some(w.amount.to_string()),
                initiated_at: Some(w.initiated_at),
                status: Some(w.status.as_str()),
            },
            None => Self {
                amount: None,
                initiated_at: None,
                status: None,
            },
        }
    }
}

fn parse_amount(s: &str) -> Result<Amount> {
    s.trim()
        .parse::<u128>()
        .map(Amount::new)
        .map_err(|e| Error::database(format!("bad amount {:?}: {}", s, e)))
}
