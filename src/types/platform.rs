//! Platform-related types for the bankroll ledger
//!
//! A [`Platform`] is one bankroll: a user's balance at one betting site. The
//! [`PlatformBook`] pairs a platform with its live ledger transactions and is the
//! unit a store locks, stages and commits atomically.

use super::bet::BetId;
use super::error::LedgerError;
use super::money::Money;
use super::transaction::{BankrollTransaction, EntrySlot, TransactionId, TransactionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier
pub type UserId = u32;

/// Stable platform identifier, assigned by the store
pub type PlatformId = u32;

/// Kind of betting site behind a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformCategory {
    /// Wagering operator whose results are fed automatically
    Operator,

    /// Any other bankroll; results are entered by hand
    #[default]
    Generic,
}

impl PlatformCategory {
    /// Whether bets on this platform need a manual result
    pub fn requires_manual_results(self) -> bool {
        matches!(self, PlatformCategory::Generic)
    }
}

impl FromStr for PlatformCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "operator" => Ok(PlatformCategory::Operator),
            "generic" | "" => Ok(PlatformCategory::Generic),
            other => Err(format!("unknown platform category '{}'", other)),
        }
    }
}

/// When a bet's stake or payout reaches the bankroll
///
/// A per-user setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankrollMode {
    /// Stake is deducted when the bet is placed; payouts are credited on a win
    #[default]
    Immediate,

    /// Nothing moves until the outcome is known; then the profit or loss is booked
    OnLoss,
}

impl fmt::Display for BankrollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankrollMode::Immediate => write!(f, "immediate"),
            BankrollMode::OnLoss => write!(f, "on_loss"),
        }
    }
}

impl FromStr for BankrollMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(BankrollMode::Immediate),
            "on_loss" | "on-loss" | "onloss" => Ok(BankrollMode::OnLoss),
            other => Err(format!("unknown bankroll mode '{}'", other)),
        }
    }
}

/// One bankroll owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub user: UserId,

    /// Display name; bets reference platforms by this name until a stable id is resolved
    pub name: String,

    pub category: PlatformCategory,

    initial_balance: Money,
    current_balance: Money,
}

impl Platform {
    /// Create a platform whose current balance starts at the initial balance
    pub fn new(
        id: PlatformId,
        user: UserId,
        name: impl Into<String>,
        category: PlatformCategory,
        initial_balance: Money,
    ) -> Self {
        Platform {
            id,
            user,
            name: name.into(),
            category,
            initial_balance,
            current_balance: initial_balance,
        }
    }

    /// Balance set at creation; never changes afterwards
    pub fn initial_balance(&self) -> Money {
        self.initial_balance
    }

    pub fn current_balance(&self) -> Money {
        self.current_balance
    }
}

/// Fields of a transaction about to be recorded
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub bet: BetId,
    pub slot: EntrySlot,

    /// Signed amount; must not be zero
    pub signed_amount: Money,

    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// A platform together with its live ledger transactions
///
/// Balance mutations only happen here, and only the stores hand out mutable
/// books (inside [`crate::core::traits::LedgerStore::transact`]).
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformBook {
    platform: Platform,
    entries: Vec<BankrollTransaction>,
    next_id: TransactionId,
}

impl PlatformBook {
    pub fn new(platform: Platform) -> Self {
        PlatformBook {
            platform,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn balance(&self) -> Money {
        self.platform.current_balance
    }

    /// Live transactions in insertion order
    pub fn entries(&self) -> &[BankrollTransaction] {
        &self.entries
    }

    /// The live transaction for a bet's slot, if any
    pub fn entry(&self, bet: BetId, slot: EntrySlot) -> Option<&BankrollTransaction> {
        self.entries
            .iter()
            .find(|tx| tx.bet == bet && tx.slot == slot)
    }

    /// Remove and return the live transaction for a bet's slot
    pub(crate) fn remove_entry(
        &mut self,
        bet: BetId,
        slot: EntrySlot,
    ) -> Option<BankrollTransaction> {
        let position = self
            .entries
            .iter()
            .position(|tx| tx.bet == bet && tx.slot == slot)?;
        Some(self.entries.remove(position))
    }

    /// Append a new transaction
    ///
    /// # Errors
    ///
    /// - `LedgerWriteFailed` if the bet already has a live transaction in this slot
    ///   (uniqueness constraint) or the amount is zero
    pub(crate) fn record_entry(
        &mut self,
        draft: EntryDraft,
    ) -> Result<BankrollTransaction, LedgerError> {
        if draft.signed_amount.is_zero() {
            return Err(LedgerError::ledger_write_failed(
                self.platform.id,
                "zero-amount transactions are not recorded",
            ));
        }

        if self.entry(draft.bet, draft.slot).is_some() {
            return Err(LedgerError::ledger_write_failed(
                self.platform.id,
                &format!(
                    "bet {} already has a live {} transaction",
                    draft.bet, draft.slot
                ),
            ));
        }

        let tx = BankrollTransaction {
            id: self.next_id,
            user: self.platform.user,
            platform: self.platform.id,
            bet: draft.bet,
            slot: draft.slot,
            kind: TransactionKind::for_amount(draft.signed_amount),
            amount: draft.signed_amount.abs(),
            balance_after: draft.balance_after,
            created_at: draft.created_at,
            description: draft.description,
        };

        self.next_id += 1;
        self.entries.push(tx.clone());

        Ok(tx)
    }

    pub(crate) fn set_balance(&mut self, balance: Money) {
        self.platform.current_balance = balance;
    }

    /// `initial_balance + Σ(live transactions, signed)`
    ///
    /// `None` on arithmetic overflow.
    pub fn ledger_total(&self) -> Option<Money> {
        self.entries
            .iter()
            .try_fold(self.platform.initial_balance, |total, tx| {
                total.checked_add(tx.signed_amount())
            })
    }

    /// Check the balance invariant
    ///
    /// # Errors
    ///
    /// - `LedgerWriteFailed` if the current balance differs from the ledger total
    pub fn verify(&self) -> Result<(), LedgerError> {
        match self.ledger_total() {
            Some(total) if total == self.platform.current_balance => Ok(()),
            Some(total) => Err(LedgerError::ledger_write_failed(
                self.platform.id,
                &format!(
                    "balance {} does not match ledger total {}",
                    self.platform.current_balance, total
                ),
            )),
            None => Err(LedgerError::arithmetic_overflow(
                "ledger total",
                self.platform.id,
            )),
        }
    }
}
