//! Core traits for ledger storage and bet storage
//!
//! This module defines the storage seams the settlement engine is written
//! against. Both the mutex-backed [`crate::core::InMemoryStore`] and the
//! DashMap-backed [`crate::core::ConcurrentStore`] implement them, so the same
//! reversal engine and bet service run on either.

use crate::types::{
    BankrollMode, BankrollTransaction, Bet, BetId, LedgerError, Money, Platform, PlatformBook,
    PlatformCategory, PlatformId, UserId,
};

/// How a caller refers to a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformRef<'a> {
    /// Stable id already stored on the bet
    Id(PlatformId),

    /// Display name typed by the user
    Name(&'a str),
}

/// Storage for platforms, their ledger transactions and bankroll settings
///
/// `transact` is the storage-layer transaction every balance change goes through.
pub trait LedgerStore: Send + Sync {
    /// Create a platform with its initial balance
    ///
    /// # Errors
    ///
    /// - `DuplicatePlatform` if the user already has a platform with this name
    fn open_platform(
        &self,
        user: UserId,
        name: &str,
        category: PlatformCategory,
        initial_balance: Money,
    ) -> Result<Platform, LedgerError>;

    /// Look up a platform owned by `user`
    fn find_platform(&self, user: UserId, platform: PlatformRef<'_>) -> Option<Platform>;

    /// All platforms of one user, sorted by name
    fn platforms_for_user(&self, user: UserId) -> Vec<Platform>;

    /// Every platform, sorted by user then name
    fn all_platforms(&self) -> Vec<Platform>;

    /// Live transactions of a platform, in insertion order
    fn transactions_for_platform(&self, platform: PlatformId) -> Vec<BankrollTransaction>;

    /// The user's bankroll mode, or the store default if never set
    fn bankroll_mode(&self, user: UserId) -> BankrollMode;

    fn set_bankroll_mode(&self, user: UserId, mode: BankrollMode);

    /// Run `f` against a platform's book as one atomic unit
    ///
    /// The platform is locked for the duration of the call, so concurrent
    /// transactions on the same platform are serialized. `f` works on a staged
    /// copy; the copy replaces the stored book only if `f` returns `Ok` and the
    /// balance invariant still holds. Otherwise the stored book is untouched.
    ///
    /// # Errors
    ///
    /// - `LedgerWriteFailed` if the platform does not exist or the invariant breaks
    /// - any error returned by `f`
    fn transact<T, F>(&self, platform: PlatformId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut PlatformBook) -> Result<T, LedgerError>;
}

/// Storage for bet records
///
/// Bet ids are scoped to their user: two users may each own a bet with the same id.
pub trait BetStore: Send + Sync {
    fn get_bet(&self, user: UserId, bet: BetId) -> Option<Bet>;

    /// Store a new bet
    ///
    /// # Errors
    ///
    /// - `DuplicateBet` if the same user already has a bet with this id
    fn insert_bet(&self, bet: Bet) -> Result<(), LedgerError>;

    /// Replace an existing bet record
    fn save_bet(&self, bet: Bet);

    /// Number of bets a user placed in a calendar month
    fn count_bets_in_month(&self, user: UserId, year: i32, month: u32) -> usize;
}
