//! Replayable bankroll events
//!
//! The replay CLI reads a log of these events and feeds them, in order, to the
//! ledger engine. Every event belongs to exactly one user, which is what the async
//! strategy partitions on.

use super::bet::{BetId, BetInput, BetUpdate, ManualResult};
use super::money::Money;
use super::platform::{BankrollMode, PlatformCategory, UserId};

/// One operation in a bankroll event log
#[derive(Debug, Clone, PartialEq)]
pub enum BetEvent {
    /// Open a platform with its initial balance
    OpenPlatform {
        user: UserId,
        name: String,
        category: PlatformCategory,
        initial_balance: Money,
    },

    /// Change the user's bankroll mode
    SetMode { user: UserId, mode: BankrollMode },

    /// Create a bet
    Create { user: UserId, input: BetInput },

    /// Edit a bet (status, stake, payout, odds)
    Update {
        user: UserId,
        bet: BetId,
        update: BetUpdate,
    },

    /// Enter a manual result for a pending bet
    Result {
        user: UserId,
        bet: BetId,
        result: ManualResult,
    },
}

impl BetEvent {
    /// The user this event belongs to
    pub fn user(&self) -> UserId {
        match self {
            BetEvent::OpenPlatform { user, .. }
            | BetEvent::SetMode { user, .. }
            | BetEvent::Create { user, .. }
            | BetEvent::Update { user, .. }
            | BetEvent::Result { user, .. } => *user,
        }
    }

    /// Short name used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            BetEvent::OpenPlatform { .. } => "platform",
            BetEvent::SetMode { .. } => "mode",
            BetEvent::Create { .. } => "create",
            BetEvent::Update { .. } => "update",
            BetEvent::Result { .. } => "result",
        }
    }
}
