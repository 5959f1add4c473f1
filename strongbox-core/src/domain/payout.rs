//! Payout domain model - an authorized outbound movement of value

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::Amount;
use super::identity::Identity;

/// Which custody path released the funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutKind {
    /// Timelocked withdrawal to the owner
    Owner,
    /// Emergency withdrawal to the registered backup address
    Backup,
}

impl PayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayoutKind::Owner => "owner",
            PayoutKind::Backup => "backup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(PayoutKind::Owner),
            "backup" => Some(PayoutKind::Backup),
            _ => None,
        }
    }
}

/// Instruction handed to the value transfer collaborator after the account
/// has already been debited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: Uuid,
    /// Account the funds were debited from
    pub owner: Identity,
    pub recipient: Identity,
    pub amount: Amount,
    pub kind: PayoutKind,
    pub executed_at: i64,
}

impl Payout {
    pub fn new(
        owner: Identity,
        recipient: Identity,
        amount: Amount,
        kind: PayoutKind,
        executed_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            recipient,
            amount,
            kind,
            executed_at,
        }
    }
}
