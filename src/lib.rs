//! Bankroll Ledger Library
//!
//! # Overview
//!
//! Keeps a per-platform cash balance ("bankroll") in step with the bets a user
//! logs. Every change to a bet's stake, payout or status is turned into ledger
//! transactions, and the platform balance always equals its initial balance plus
//! the signed sum of its live transactions.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Money, Platform, Bet, BankrollTransaction, errors)
//! - [`core`] - Business logic:
//!   - [`core::policy`] - Which ledger entries a bet must carry in each bankroll mode
//!   - [`core::reversal`] - Reverse-then-reapply ledger writes, atomic per platform
//!   - [`core::bet_service`] - Create, update and manual-result operations
//!   - [`core::store`] / [`core::async`] - Mutex-backed and DashMap-backed stores
//! - [`io`] - CSV event parsing and platform output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Bankroll Modes
//!
//! - **immediate**: the stake leaves the bankroll when the bet is placed; a win
//!   credits the full payout
//! - **on_loss**: nothing moves until the result is known; then the profit or
//!   the lost stake is booked
//!
//! Both modes end at the same balance once a bet is settled.
//!
//! # Reversal
//!
//! A bet owns at most one stake entry and one settlement entry per platform.
//! Re-settling a bet removes the old entry and books the new one in the same
//! store transaction, so applying the same result twice changes nothing and a
//! correction from won to lost nets out exactly.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    BetService, BetStore, Collaborators, ConcurrentStore, InMemoryStore, LedgerEngine,
    LedgerOutcome, LedgerStore, PlatformRef, ReversalEngine,
};
pub use io::write_platforms_csv;
pub use types::{
    BankrollMode, BankrollTransaction, Bet, BetEvent, BetId, BetInput, BetStatus, BetUpdate,
    ErrorKind, LedgerError, ManualResult, Money, Platform, PlatformCategory, PlatformId, UserId,
};
