//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `money`: fixed-precision monetary amounts
//! - `platform`: platforms, bankroll modes and platform books
//! - `bet`: bets, statuses and operation inputs
//! - `transaction`: ledger transactions
//! - `event`: replayable bankroll events
//! - `error`: error types for the ledger

pub mod bet;
pub mod error;
pub mod event;
pub mod money;
pub mod platform;
pub mod transaction;

pub use bet::{Bet, BetId, BetInput, BetStatus, BetUpdate, ManualResult};
pub use error::{ErrorKind, LedgerError};
pub use event::BetEvent;
pub use money::Money;
pub use platform::{
    BankrollMode, EntryDraft, Platform, PlatformBook, PlatformCategory, PlatformId, UserId,
};
pub use transaction::{BankrollTransaction, EntrySlot, TransactionId, TransactionKind};
