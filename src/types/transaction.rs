//! Ledger transaction types for the bankroll ledger
//!
//! A [`BankrollTransaction`] records one balance-affecting event caused by one
//! bet. Transactions are never edited: the reversal engine deletes the old row
//! and inserts a new one.

use super::bet::BetId;
use super::money::Money;
use super::platform::{PlatformId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier
///
/// Sequence number scoped to a platform; `(platform, id)` is globally unique.
pub type TransactionId = u64;

/// Direction of a ledger transaction
///
/// The stored amount is always positive; the kind carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Increases the platform balance
    Credit,

    /// Decreases the platform balance
    Debit,
}

impl TransactionKind {
    /// Kind matching the sign of a non-zero signed amount
    pub fn for_amount(signed: Money) -> Self {
        if signed.is_negative() {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        }
    }
}

/// Which of a bet's ledger effects a transaction represents
///
/// In `immediate` mode a bet can hold a stake deduction and a settlement at the
/// same time; `on_loss` mode only ever uses [`EntrySlot::Settlement`]. The store
/// allows at most one live transaction per `(bet, platform, slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySlot {
    /// Stake deducted when the bet is placed
    Stake,

    /// Effect of the bet's outcome
    Settlement,
}

impl fmt::Display for EntrySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySlot::Stake => write!(f, "stake"),
            EntrySlot::Settlement => write!(f, "settlement"),
        }
    }
}

/// A live ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollTransaction {
    pub id: TransactionId,
    pub user: UserId,
    pub platform: PlatformId,

    /// Bet that caused this transaction
    pub bet: BetId,

    pub slot: EntrySlot,
    pub kind: TransactionKind,

    /// Always positive; sign implied by `kind`
    pub amount: Money,

    /// Platform balance right after this transaction was applied
    pub balance_after: Money,

    pub created_at: DateTime<Utc>,
    pub description: String,
}

impl BankrollTransaction {
    /// Signed effect of this transaction on the platform balance
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        }
    }
}
