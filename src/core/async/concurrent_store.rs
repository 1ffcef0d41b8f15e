//! Thread-safe ledger and bet storage for async batch processing
//!
//! This module provides the `ConcurrentStore` struct, which keeps platform books,
//! bets and bankroll settings in `DashMap`s so different platforms can be written
//! from different threads at the same time.
//!
//! # Design
//!
//! Each platform book is one DashMap entry. `transact` holds that entry's write
//! guard for the whole read-modify-write, which gives row-level locking: two
//! settlements on the same platform queue up behind each other, settlements on
//! different platforms proceed in parallel. The closure works on a staged clone
//! that replaces the stored book only after the balance invariant is verified.

use crate::core::traits::{BetStore, LedgerStore, PlatformRef};
use crate::types::{
    BankrollMode, BankrollTransaction, Bet, BetId, LedgerError, Money, Platform, PlatformBook,
    PlatformCategory, PlatformId, UserId,
};
use chrono::Datelike;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Concurrent store for platforms, ledger transactions and bets
///
/// # Thread Safety
///
/// All methods take `&self` and are safe to call from many threads. Operations
/// on the same platform are serialized by the DashMap entry lock; nothing is
/// locked globally.
#[derive(Debug)]
pub struct ConcurrentStore {
    platforms: DashMap<PlatformId, PlatformBook>,

    /// (user, name) -> platform id
    names: DashMap<(UserId, String), PlatformId>,

    bets: DashMap<(UserId, BetId), Bet>,
    modes: DashMap<UserId, BankrollMode>,
    next_platform_id: AtomicU32,
    default_mode: BankrollMode,
}

impl ConcurrentStore {
    /// Create an empty store whose users default to `immediate` mode
    pub fn new() -> Self {
        Self::with_default_mode(BankrollMode::default())
    }

    /// Create an empty store with a given default bankroll mode
    pub fn with_default_mode(default_mode: BankrollMode) -> Self {
        Self {
            platforms: DashMap::new(),
            names: DashMap::new(),
            bets: DashMap::new(),
            modes: DashMap::new(),
            next_platform_id: AtomicU32::new(0),
            default_mode,
        }
    }
}

impl Default for ConcurrentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for ConcurrentStore {
    fn open_platform(
        &self,
        user: UserId,
        name: &str,
        category: PlatformCategory,
        initial_balance: Money,
    ) -> Result<Platform, LedgerError> {
        let id = self.next_platform_id.fetch_add(1, Ordering::SeqCst) + 1;
        let platform = Platform::new(id, user, name, category, initial_balance);

        // Book first, then the name: a reader that finds the name always finds the book.
        self.platforms
            .insert(id, PlatformBook::new(platform.clone()));

        let mut claimed = false;
        self.names.entry((user, name.to_string())).or_insert_with(|| {
            claimed = true;
            id
        });

        if !claimed {
            self.platforms.remove(&id);
            return Err(LedgerError::duplicate_platform(user, name));
        }

        Ok(platform)
    }

    fn find_platform(&self, user: UserId, platform: PlatformRef<'_>) -> Option<Platform> {
        let id = match platform {
            PlatformRef::Id(id) => id,
            PlatformRef::Name(name) => *self.names.get(&(user, name.to_string()))?,
        };

        self.platforms
            .get(&id)
            .map(|book| book.platform().clone())
            .filter(|platform| platform.user == user)
    }

    fn platforms_for_user(&self, user: UserId) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .platforms
            .iter()
            .filter(|entry| entry.value().platform().user == user)
            .map(|entry| entry.value().platform().clone())
            .collect();
        platforms.sort_by(|a, b| a.name.cmp(&b.name));
        platforms
    }

    fn all_platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .platforms
            .iter()
            .map(|entry| entry.value().platform().clone())
            .collect();
        platforms.sort_by(|a, b| (a.user, &a.name).cmp(&(b.user, &b.name)));
        platforms
    }

    fn transactions_for_platform(&self, platform: PlatformId) -> Vec<BankrollTransaction> {
        self.platforms
            .get(&platform)
            .map(|book| book.entries().to_vec())
            .unwrap_or_default()
    }

    fn bankroll_mode(&self, user: UserId) -> BankrollMode {
        self.modes
            .get(&user)
            .map(|mode| *mode.value())
            .unwrap_or(self.default_mode)
    }

    fn set_bankroll_mode(&self, user: UserId, mode: BankrollMode) {
        self.modes.insert(user, mode);
    }

    fn transact<T, F>(&self, platform: PlatformId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut PlatformBook) -> Result<T, LedgerError>,
    {
        let mut entry = self
            .platforms
            .get_mut(&platform)
            .ok_or_else(|| LedgerError::ledger_write_failed(platform, "platform does not exist"))?;

        let mut staged = entry.value().clone();
        let value = f(&mut staged)?;
        staged.verify()?;

        *entry.value_mut() = staged;

        Ok(value)
    }
}

impl BetStore for ConcurrentStore {
    fn get_bet(&self, user: UserId, bet: BetId) -> Option<Bet> {
        self.bets.get(&(user, bet)).map(|entry| entry.value().clone())
    }

    fn insert_bet(&self, bet: Bet) -> Result<(), LedgerError> {
        let id = bet.id;
        let mut inserted = false;
        self.bets.entry((bet.user, id)).or_insert_with(|| {
            inserted = true;
            bet
        });

        if inserted {
            Ok(())
        } else {
            Err(LedgerError::duplicate_bet(id))
        }
    }

    fn save_bet(&self, bet: Bet) {
        self.bets.insert((bet.user, bet.id), bet);
    }

    fn count_bets_in_month(&self, user: UserId, year: i32, month: u32) -> usize {
        self.bets
            .iter()
            .filter(|entry| {
                let bet = entry.value();
                bet.user == user && bet.placed_at.year() == year && bet.placed_at.month() == month
            })
            .count()
    }
}
