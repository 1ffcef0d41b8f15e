//! In-memory ledger and bet storage
//!
//! This module provides the `InMemoryStore` used by the synchronous strategy and
//! by tests. All state sits behind one `Mutex`, so every store transaction is
//! serialized against every other one.
//!
//! # Atomicity
//!
//! `transact` clones the platform's book, runs the caller's closure on the
//! clone, verifies the balance invariant and only then swaps the clone in. A
//! failing closure leaves the stored book exactly as it was.

use crate::core::traits::{BetStore, LedgerStore, PlatformRef};
use crate::types::{
    BankrollMode, BankrollTransaction, Bet, BetId, LedgerError, Money, Platform, PlatformBook,
    PlatformCategory, PlatformId, UserId,
};
use chrono::Datelike;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StoreState {
    platforms: HashMap<PlatformId, PlatformBook>,

    /// (user, name) -> platform id
    names: HashMap<(UserId, String), PlatformId>,

    bets: HashMap<(UserId, BetId), Bet>,
    modes: HashMap<UserId, BankrollMode>,
    next_platform_id: PlatformId,
}

/// Mutex-backed store for platforms, ledger transactions and bets
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    default_mode: BankrollMode,
}

impl InMemoryStore {
    /// Create an empty store whose users default to `immediate` mode
    pub fn new() -> Self {
        Self::with_default_mode(BankrollMode::default())
    }

    /// Create an empty store with a given default bankroll mode
    pub fn with_default_mode(default_mode: BankrollMode) -> Self {
        InMemoryStore {
            state: Mutex::new(StoreState::default()),
            default_mode,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic inside a closure never leaves a half-written book behind
        // (books are swapped in whole), so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for InMemoryStore {
    fn open_platform(
        &self,
        user: UserId,
        name: &str,
        category: PlatformCategory,
        initial_balance: Money,
    ) -> Result<Platform, LedgerError> {
        let mut state = self.lock();

        let key = (user, name.to_string());
        if state.names.contains_key(&key) {
            return Err(LedgerError::duplicate_platform(user, name));
        }

        state.next_platform_id += 1;
        let platform = Platform::new(
            state.next_platform_id,
            user,
            name,
            category,
            initial_balance,
        );

        state.names.insert(key, platform.id);
        state
            .platforms
            .insert(platform.id, PlatformBook::new(platform.clone()));

        Ok(platform)
    }

    fn find_platform(&self, user: UserId, platform: PlatformRef<'_>) -> Option<Platform> {
        let state = self.lock();

        let id = match platform {
            PlatformRef::Id(id) => id,
            PlatformRef::Name(name) => *state.names.get(&(user, name.to_string()))?,
        };

        state
            .platforms
            .get(&id)
            .map(|book| book.platform())
            .filter(|platform| platform.user == user)
            .cloned()
    }

    fn platforms_for_user(&self, user: UserId) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .lock()
            .platforms
            .values()
            .map(|book| book.platform())
            .filter(|platform| platform.user == user)
            .cloned()
            .collect();
        platforms.sort_by(|a, b| a.name.cmp(&b.name));
        platforms
    }

    fn all_platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .lock()
            .platforms
            .values()
            .map(|book| book.platform().clone())
            .collect();
        platforms.sort_by(|a, b| (a.user, &a.name).cmp(&(b.user, &b.name)));
        platforms
    }

    fn transactions_for_platform(&self, platform: PlatformId) -> Vec<BankrollTransaction> {
        self.lock()
            .platforms
            .get(&platform)
            .map(|book| book.entries().to_vec())
            .unwrap_or_default()
    }

    fn bankroll_mode(&self, user: UserId) -> BankrollMode {
        self.lock()
            .modes
            .get(&user)
            .copied()
            .unwrap_or(self.default_mode)
    }

    fn set_bankroll_mode(&self, user: UserId, mode: BankrollMode) {
        self.lock().modes.insert(user, mode);
    }

    fn transact<T, F>(&self, platform: PlatformId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut PlatformBook) -> Result<T, LedgerError>,
    {
        let mut state = self.lock();

        let mut staged = state
            .platforms
            .get(&platform)
            .cloned()
            .ok_or_else(|| LedgerError::ledger_write_failed(platform, "platform does not exist"))?;

        let value = f(&mut staged)?;
        staged.verify()?;

        state.platforms.insert(platform, staged);

        Ok(value)
    }
}

impl BetStore for InMemoryStore {
    fn get_bet(&self, user: UserId, bet: BetId) -> Option<Bet> {
        self.lock().bets.get(&(user, bet)).cloned()
    }

    fn insert_bet(&self, bet: Bet) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let key = (bet.user, bet.id);
        if state.bets.contains_key(&key) {
            return Err(LedgerError::duplicate_bet(bet.id));
        }
        state.bets.insert(key, bet);
        Ok(())
    }

    fn save_bet(&self, bet: Bet) {
        self.lock().bets.insert((bet.user, bet.id), bet);
    }

    fn count_bets_in_month(&self, user: UserId, year: i32, month: u32) -> usize {
        self.lock()
            .bets
            .values()
            .filter(|bet| {
                bet.user == user && bet.placed_at.year() == year && bet.placed_at.month() == month
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetStatus, EntryDraft, EntrySlot};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bet(id: BetId, user: UserId, year: i32, month: u32) -> Bet {
        Bet {
            id,
            user,
            placed_at: Utc.with_ymd_and_hms(year, month, 10, 12, 0, 0).unwrap(),
            label: None,
            stake: Money::new(dec!(10)),
            payout: None,
            profit: None,
            odds: None,
            status: BetStatus::Pending,
            mode: BankrollMode::Immediate,
            platform_name: "PMU".to_string(),
            platform_id: None,
            requires_manual_update: false,
        }
    }

    #[test]
    fn test_open_platform_assigns_ids() {
        let store = InMemoryStore::new();

        let pmu = store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::new(dec!(100)))
            .unwrap();
        let other = store
            .open_platform(1, "Betclic", PlatformCategory::Generic, Money::new(dec!(50)))
            .unwrap();

        assert_ne!(pmu.id, other.id);
        assert_eq!(pmu.current_balance(), Money::new(dec!(100)));
    }

    #[test]
    fn test_open_platform_rejects_duplicate_name_per_user() {
        let store = InMemoryStore::new();
        store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::ZERO)
            .unwrap();

        let duplicate = store.open_platform(1, "PMU", PlatformCategory::Operator, Money::ZERO);
        assert!(matches!(
            duplicate,
            Err(LedgerError::DuplicatePlatform { .. })
        ));

        // Same name for another user is fine
        assert!(store
            .open_platform(2, "PMU", PlatformCategory::Operator, Money::ZERO)
            .is_ok());
    }

    #[test]
    fn test_find_platform_is_scoped_to_user() {
        let store = InMemoryStore::new();
        let pmu = store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::ZERO)
            .unwrap();

        assert!(store.find_platform(1, PlatformRef::Name("PMU")).is_some());
        assert!(store.find_platform(1, PlatformRef::Id(pmu.id)).is_some());
        assert!(store.find_platform(2, PlatformRef::Name("PMU")).is_none());
        assert!(store.find_platform(2, PlatformRef::Id(pmu.id)).is_none());
        assert!(store.find_platform(1, PlatformRef::Name("Unknown")).is_none());
    }

    #[test]
    fn test_transact_commits_on_success() {
        let store = InMemoryStore::new();
        let pmu = store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::new(dec!(100)))
            .unwrap();

        store
            .transact(pmu.id, |book| {
                book.record_entry(EntryDraft {
                    bet: 1,
                    slot: EntrySlot::Stake,
                    signed_amount: Money::new(dec!(-10)),
                    balance_after: Money::new(dec!(90)),
                    created_at: Utc::now(),
                    description: "stake".to_string(),
                })?;
                book.set_balance(Money::new(dec!(90)));
                Ok(())
            })
            .unwrap();

        let platform = store.find_platform(1, PlatformRef::Id(pmu.id)).unwrap();
        assert_eq!(platform.current_balance(), Money::new(dec!(90)));
        assert_eq!(store.transactions_for_platform(pmu.id).len(), 1);
    }

    #[test]
    fn test_transact_rolls_back_on_error() {
        let store = InMemoryStore::new();
        let pmu = store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::new(dec!(100)))
            .unwrap();

        let result: Result<(), LedgerError> = store.transact(pmu.id, |book| {
            book.set_balance(Money::new(dec!(50)));
            Err(LedgerError::ledger_write_failed(pmu.id, "simulated"))
        });

        assert!(result.is_err());
        let platform = store.find_platform(1, PlatformRef::Id(pmu.id)).unwrap();
        assert_eq!(platform.current_balance(), Money::new(dec!(100)));
    }

    #[test]
    fn test_transact_rejects_invariant_breach() {
        let store = InMemoryStore::new();
        let pmu = store
            .open_platform(1, "PMU", PlatformCategory::Operator, Money::new(dec!(100)))
            .unwrap();

        // Balance moved without a matching transaction
        let result = store.transact(pmu.id, |book| {
            book.set_balance(Money::new(dec!(80)));
            Ok(())
        });

        assert!(matches!(
            result,
            Err(LedgerError::LedgerWriteFailed { .. })
        ));
        let platform = store.find_platform(1, PlatformRef::Id(pmu.id)).unwrap();
        assert_eq!(platform.current_balance(), Money::new(dec!(100)));
    }

    #[test]
    fn test_transact_unknown_platform() {
        let store = InMemoryStore::new();
        let result = store.transact(99, |_book| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn test_bankroll_mode_defaults_and_overrides() {
        let store = InMemoryStore::with_default_mode(BankrollMode::OnLoss);

        assert_eq!(store.bankroll_mode(1), BankrollMode::OnLoss);
        store.set_bankroll_mode(1, BankrollMode::Immediate);
        assert_eq!(store.bankroll_mode(1), BankrollMode::Immediate);
        assert_eq!(store.bankroll_mode(2), BankrollMode::OnLoss);
    }

    #[test]
    fn test_insert_bet_rejects_duplicates() {
        let store = InMemoryStore::new();
        store.insert_bet(bet(1, 1, 2026, 10)).unwrap();

        assert_eq!(
            store.insert_bet(bet(1, 1, 2026, 10)),
            Err(LedgerError::DuplicateBet { bet: 1 })
        );
    }

    #[test]
    fn test_bet_ids_are_scoped_per_user() {
        let store = InMemoryStore::new();
        store.insert_bet(bet(1, 1, 2026, 10)).unwrap();
        store.insert_bet(bet(1, 2, 2026, 10)).unwrap();

        assert_eq!(store.get_bet(1, 1).unwrap().user, 1);
        assert_eq!(store.get_bet(2, 1).unwrap().user, 2);
        assert!(store.get_bet(3, 1).is_none());
    }

    #[test]
    fn test_count_bets_in_month() {
        let store = InMemoryStore::new();
        store.insert_bet(bet(1, 1, 2026, 10)).unwrap();
        store.insert_bet(bet(2, 1, 2026, 10)).unwrap();
        store.insert_bet(bet(3, 1, 2026, 9)).unwrap();
        store.insert_bet(bet(4, 2, 2026, 10)).unwrap();

        assert_eq!(store.count_bets_in_month(1, 2026, 10), 2);
        assert_eq!(store.count_bets_in_month(1, 2026, 9), 1);
        assert_eq!(store.count_bets_in_month(2, 2026, 10), 1);
    }
}
