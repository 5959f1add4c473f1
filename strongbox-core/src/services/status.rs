//! Status service - custody summary across all accounts

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::Amount;
use crate::ports::AccountRepository;

/// Status service for registry-wide summaries
pub struct StatusService {
    repository: Arc<dyn AccountRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.repository.list_accounts()?;

        let mut total_custody = Amount::ZERO;
        for account in &accounts {
            total_custody = total_custody
                .checked_add(account.balance)
                .ok_or_else(|| Error::validation("total custody overflows u128"))?;
        }

        Ok(StatusSummary {
            total_accounts: accounts.len(),
            frozen_accounts: accounts.iter().filter(|a| a.frozen).count(),
            pending_withdrawals: accounts
                .iter()
                .filter(|a| a.pending_withdrawal.as_ref().is_some_and(|w| w.is_pending()))
                .count(),
            total_custody,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total_accounts: usize,
    pub frozen_accounts: usize,
    pub pending_withdrawals: usize,
    pub total_custody: Amount,
}
