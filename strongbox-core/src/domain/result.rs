//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// The first group of variants is the custody rejection taxonomy: each one
/// aborts an operation before anything is written. The rest are ambient
/// failures from storage, configuration and the transfer collaborator.
#[derive(Error, Debug)]
pub enum Error {
    #[error("An account already exists for {0}")]
    DuplicateAccount(String),

    #[error("No account found for {0}")]
    AccountNotFound(String),

    #[error("Account is frozen")]
    AccountFrozen,

    #[error("Account is not frozen")]
    AccountNotFrozen,

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("No active pending withdrawal")]
    NoActivePendingWithdrawal,

    #[error("Amount {requested} does not match pending withdrawal of {pending}")]
    AmountMismatch { requested: u128, pending: u128 },

    #[error("Timelock not elapsed: {remaining_secs}s remaining")]
    TimelockNotElapsed { remaining_secs: i64 },

    #[error("Timelock expired {overdue_secs}s ago")]
    TimelockExpired { overdue_secs: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Data directory is busy: {0}")]
    Busy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable snake_case code, safe to log (carries no amounts or identities)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DuplicateAccount(_) => "duplicate_account",
            Error::AccountNotFound(_) => "account_not_found",
            Error::AccountFrozen => "account_frozen",
            Error::AccountNotFrozen => "account_not_frozen",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::NoActivePendingWithdrawal => "no_active_pending_withdrawal",
            Error::AmountMismatch { .. } => "amount_mismatch",
            Error::TimelockNotElapsed { .. } => "timelock_not_elapsed",
            Error::TimelockExpired { .. } => "timelock_expired",
            Error::Validation(_) => "validation",
            Error::Database(_) => "database",
            Error::Config(_) => "config",
            Error::Transfer(_) => "transfer",
            Error::Busy(_) => "busy",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    /// True for precondition rejections raised by the custody state machine
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::DuplicateAccount(_)
                | Error::AccountNotFound(_)
                | Error::AccountFrozen
                | Error::AccountNotFrozen
                | Error::InsufficientBalance { .. }
                | Error::NoActivePendingWithdrawal
                | Error::AmountMismatch { .. }
                | Error::TimelockNotElapsed { .. }
                | Error::TimelockExpired { .. }
        )
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Database(err.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            context: None,
        }
    }

    /// Create a successful result with context
    pub fn ok_with_context(data: T, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            context: Some(context),
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            error_kind: None,
            context: None,
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                let mut failed = Self::fail(e.to_string());
                failed.error_kind = Some(e.kind().to_string());
                failed
            }
        }
    }
}
