//! Pending withdrawal slot and the timelock window

use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::result::{Error, Result};

/// 24 hours in seconds
pub const DEFAULT_MIN_DELAY_SECS: i64 = 24 * 60 * 60;

/// 48 hours in seconds
pub const DEFAULT_MAX_DELAY_SECS: i64 = 48 * 60 * 60;

/// Lifecycle of a withdrawal record. Cancelled and Completed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Cancelled,
    Completed,
}

impl WithdrawalStatus {
    /// Stable numeric code for external callers
    pub fn code(self) -> u8 {
        match self {
            WithdrawalStatus::Pending => 0,
            WithdrawalStatus::Cancelled => 1,
            WithdrawalStatus::Completed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Cancelled => "cancelled",
            WithdrawalStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WithdrawalStatus::Pending),
            "cancelled" => Some(WithdrawalStatus::Cancelled),
            "completed" => Some(WithdrawalStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

/// The single withdrawal intent recorded on an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub amount: Amount,
    /// Clock reading at initiation (unix seconds)
    pub initiated_at: i64,
    pub status: WithdrawalStatus,
}

impl WithdrawalRecord {
    pub fn pending(amount: Amount, initiated_at: i64) -> Self {
        Self {
            amount,
            initiated_at,
            status: WithdrawalStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }

    /// Pending -> Cancelled
    pub(crate) fn cancel(&mut self) -> Result<()> {
        if !self.is_pending() {
            return Err(Error::NoActivePendingWithdrawal);
        }
        self.status = WithdrawalStatus::Cancelled;
        Ok(())
    }

    /// Pending -> Completed
    pub(crate) fn complete(&mut self) -> Result<()> {
        if !self.is_pending() {
            return Err(Error::NoActivePendingWithdrawal);
        }
        self.status = WithdrawalStatus::Completed;
        Ok(())
    }

    pub fn details(&self) -> WithdrawalDetails {
        WithdrawalDetails {
            status: self.status,
            status_code: self.status.code(),
            amount: self.amount,
            initiated_at: self.initiated_at,
        }
    }
}

/// Read-only view returned by `get_withdrawal_details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalDetails {
    pub status: WithdrawalStatus,
    pub status_code: u8,
    pub amount: Amount,
    pub initiated_at: i64,
}

/// Closed window `[min_delay, max_delay]` after initiation in which a
/// withdrawal may be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelockPolicy {
    pub min_delay_secs: i64,
    pub max_delay_secs: i64,
}

impl Default for TimelockPolicy {
    fn default() -> Self {
        Self {
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

impl TimelockPolicy {
    pub fn new(min_delay_secs: i64, max_delay_secs: i64) -> Result<Self> {
        let policy = Self {
            min_delay_secs,
            max_delay_secs,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_delay_secs < 0 || self.max_delay_secs < 0 {
            return Err(Error::config("timelock delays cannot be negative"));
        }
        if self.min_delay_secs > self.max_delay_secs {
            return Err(Error::config(format!(
                "timelock min delay ({}s) exceeds max delay ({}s)",
                self.min_delay_secs, self.max_delay_secs
            )));
        }
        Ok(())
    }

    /// Check `now` against the window opened at `initiated_at`
    ///
    /// A clock reading before `initiated_at` counts as not elapsed.
    pub fn check(&self, initiated_at: i64, now: i64) -> Result<()> {
        let elapsed = now.checked_sub(initiated_at).unwrap_or(i64::MIN);
        if elapsed < self.min_delay_secs {
            let remaining_secs = self.opens_at(initiated_at).saturating_sub(now);
            return Err(Error::TimelockNotElapsed { remaining_secs });
        }
        if elapsed > self.max_delay_secs {
            let overdue_secs = now.saturating_sub(self.closes_at(initiated_at));
            return Err(Error::TimelockExpired { overdue_secs });
        }
        Ok(())
    }

    /// First instant at which completion is allowed
    pub fn opens_at(&self, initiated_at: i64) -> i64 {
        initiated_at.saturating_add(self.min_delay_secs)
    }

    /// Last instant at which completion is allowed
    pub fn closes_at(&self, initiated_at: i64) -> i64 {
        initiated_at.saturating_add(self.max_delay_secs)
    }
}
