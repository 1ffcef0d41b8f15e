//! Reversal engine
//!
//! Applies a bet's ledger instructions to a platform balance. For every
//! instruction it reverses the bet's existing entry in that slot, then records
//! the new signed amount, so calling it again with the same instructions leaves
//! the balance where the first call put it.
//!
//! The platform balance always equals its initial balance plus the signed sum
//! of the live transactions. All instructions of one call are written in a
//! single store transaction; on failure neither the transactions nor the
//! balance change.

use crate::core::policy::LedgerInstruction;
use crate::core::traits::{LedgerStore, PlatformRef};
use crate::types::{
    BankrollTransaction, BetId, EntryDraft, EntrySlot, LedgerError, Money, PlatformId, UserId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// One call into the reversal engine
#[derive(Debug, Clone)]
pub struct LedgerRequest<'a> {
    pub user: UserId,
    pub platform: PlatformRef<'a>,
    pub bet: BetId,
    pub instructions: &'a [LedgerInstruction],
    pub effective_at: DateTime<Utc>,

    /// Appended to transaction descriptions, e.g. the bet's new status
    pub context: &'a str,
}

/// Why a ledger update was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No platform with this name belongs to the user
    UnknownPlatformName(String),

    /// The platform id stored on the bet no longer resolves for the user
    UnknownPlatformId(PlatformId),
}

/// What a committed ledger call changed
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReceipt {
    pub platform: PlatformId,
    pub balance_before: Money,
    pub balance_after: Money,

    /// Prior entries that were reversed and deleted
    pub removed: Vec<BankrollTransaction>,

    /// Entries inserted by this call
    pub recorded: Vec<BankrollTransaction>,
}

impl LedgerReceipt {
    /// Net change of the platform balance
    pub fn movement(&self) -> Money {
        // Both balances come out of a verified book, so this cannot overflow
        // unless the balances themselves sit at the decimal limits.
        self.balance_after
            .checked_sub(self.balance_before)
            .unwrap_or(Money::ZERO)
    }
}

/// Result of a ledger call
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    /// Instructions were written
    Applied(LedgerReceipt),

    /// Platform could not be resolved; the bankroll was not adjusted
    Skipped(SkipReason),

    /// No instructions to apply
    Unchanged,
}

impl LedgerOutcome {
    /// Platform the instructions were written to, if any
    pub fn platform(&self) -> Option<PlatformId> {
        match self {
            LedgerOutcome::Applied(receipt) => Some(receipt.platform),
            LedgerOutcome::Skipped(_) | LedgerOutcome::Unchanged => None,
        }
    }
}

/// Applies ledger instructions with reverse-then-reapply semantics
#[derive(Debug)]
pub struct ReversalEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for ReversalEngine<S> {
    fn clone(&self) -> Self {
        ReversalEngine {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> ReversalEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        ReversalEngine { store }
    }

    /// Apply a request's instructions to its platform
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerOutcome::Applied)` - instructions committed
    /// * `Ok(LedgerOutcome::Skipped)` - platform not found; nothing written
    /// * `Ok(LedgerOutcome::Unchanged)` - empty instruction list
    ///
    /// # Errors
    ///
    /// - `LedgerWriteFailed` if the store transaction failed; nothing was written
    pub fn apply(&self, request: LedgerRequest<'_>) -> Result<LedgerOutcome, LedgerError> {
        if request.instructions.is_empty() {
            return Ok(LedgerOutcome::Unchanged);
        }

        let Some(platform) = self.store.find_platform(request.user, request.platform) else {
            let reason = match request.platform {
                PlatformRef::Name(name) => SkipReason::UnknownPlatformName(name.to_string()),
                PlatformRef::Id(id) => SkipReason::UnknownPlatformId(id),
            };
            warn!(
                user = request.user,
                bet = request.bet,
                platform = ?request.platform,
                "platform not found, bankroll not adjusted"
            );
            return Ok(LedgerOutcome::Skipped(reason));
        };

        let platform_id = platform.id;
        let receipt = self
            .store
            .transact(platform_id, |book| {
                let balance_before = book.balance();
                let mut working = balance_before;
                let mut removed = Vec::new();
                let mut recorded = Vec::new();

                for instruction in request.instructions {
                    if let Some(prior) = book.remove_entry(request.bet, instruction.slot) {
                        working = working
                            .checked_sub(prior.signed_amount())
                            .ok_or_else(|| LedgerError::arithmetic_overflow("reversal", platform_id))?;
                        removed.push(prior);
                    }

                    working = working
                        .checked_add(instruction.amount)
                        .ok_or_else(|| LedgerError::arithmetic_overflow("apply", platform_id))?;

                    if !instruction.amount.is_zero() {
                        let tx = book.record_entry(EntryDraft {
                            bet: request.bet,
                            slot: instruction.slot,
                            signed_amount: instruction.amount,
                            balance_after: working,
                            created_at: request.effective_at,
                            description: describe(request.bet, instruction.slot, request.context),
                        })?;
                        recorded.push(tx);
                    }
                }

                book.set_balance(working);

                Ok(LedgerReceipt {
                    platform: platform_id,
                    balance_before,
                    balance_after: working,
                    removed,
                    recorded,
                })
            })
            .map_err(|e| {
                error!(
                    user = request.user,
                    bet = request.bet,
                    platform = platform_id,
                    error = %e,
                    "ledger update rolled back"
                );
                match e {
                    LedgerError::LedgerWriteFailed { .. } => e,
                    other => LedgerError::ledger_write_failed(platform_id, &other.to_string()),
                }
            })?;

        debug!(
            user = request.user,
            bet = request.bet,
            platform = platform_id,
            before = %receipt.balance_before,
            after = %receipt.balance_after,
            reversed = receipt.removed.len(),
            recorded = receipt.recorded.len(),
            "ledger updated"
        );

        Ok(LedgerOutcome::Applied(receipt))
    }
}

fn describe(bet: BetId, slot: EntrySlot, context: &str) -> String {
    match slot {
        EntrySlot::Stake => format!("Stake for bet #{}", bet),
        EntrySlot::Settlement => format!("Bet #{} settled ({})", bet, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::InMemoryStore;
    use crate::types::{PlatformCategory, TransactionKind};
    use rust_decimal_macros::dec;

    fn setup(initial: Money) -> (ReversalEngine<InMemoryStore>, Arc<InMemoryStore>, PlatformId) {
        let store = Arc::new(InMemoryStore::new());
        let platform = store
            .open_platform(1, "PMU", PlatformCategory::Operator, initial)
            .unwrap();
        (ReversalEngine::new(Arc::clone(&store)), store, platform.id)
    }

    fn apply(
        engine: &ReversalEngine<InMemoryStore>,
        bet: BetId,
        instructions: &[LedgerInstruction],
    ) -> Result<LedgerOutcome, LedgerError> {
        engine.apply(LedgerRequest {
            user: 1,
            platform: PlatformRef::Name("PMU"),
            bet,
            instructions,
            effective_at: Utc::now(),
            context: "test",
        })
    }

    fn balance(store: &InMemoryStore, platform: PlatformId) -> Money {
        store
            .find_platform(1, PlatformRef::Id(platform))
            .unwrap()
            .current_balance()
    }

    #[test]
    fn test_apply_records_debit() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        let outcome = apply(
            &engine,
            1,
            &[LedgerInstruction::stake(Money::new(dec!(-10)))],
        )
        .unwrap();

        assert_eq!(balance(&store, platform), Money::new(dec!(90)));
        let transactions = store.transactions_for_platform(platform);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Debit);
        assert_eq!(transactions[0].amount, Money::new(dec!(10)));
        assert_eq!(transactions[0].balance_after, Money::new(dec!(90)));

        match outcome {
            LedgerOutcome::Applied(receipt) => {
                assert_eq!(receipt.movement(), Money::new(dec!(-10)));
                assert!(receipt.removed.is_empty());
            }
            other => panic!("expected applied outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));
        let instructions = [LedgerInstruction::settlement(Money::new(dec!(40)))];

        apply(&engine, 1, &instructions).unwrap();
        apply(&engine, 1, &instructions).unwrap();

        assert_eq!(balance(&store, platform), Money::new(dec!(140)));
        assert_eq!(store.transactions_for_platform(platform).len(), 1);
    }

    #[test]
    fn test_apply_reverses_prior_entry() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        apply(&engine, 1, &[LedgerInstruction::settlement(Money::new(dec!(40)))]).unwrap();
        apply(&engine, 1, &[LedgerInstruction::settlement(Money::new(dec!(-10)))]).unwrap();

        // 100 + 40, reversed to 100, then -10
        assert_eq!(balance(&store, platform), Money::new(dec!(90)));
        let transactions = store.transactions_for_platform(platform);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Debit);
    }

    #[test]
    fn test_zero_amount_removes_prior_entry() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        apply(&engine, 1, &[LedgerInstruction::settlement(Money::new(dec!(35)))]).unwrap();
        apply(&engine, 1, &[LedgerInstruction::settlement(Money::ZERO)]).unwrap();

        assert_eq!(balance(&store, platform), Money::new(dec!(100)));
        assert!(store.transactions_for_platform(platform).is_empty());
    }

    #[test]
    fn test_slots_are_independent() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        apply(&engine, 1, &[LedgerInstruction::stake(Money::new(dec!(-10)))]).unwrap();
        apply(&engine, 1, &[LedgerInstruction::settlement(Money::new(dec!(35)))]).unwrap();

        assert_eq!(balance(&store, platform), Money::new(dec!(125)));
        assert_eq!(store.transactions_for_platform(platform).len(), 2);
    }

    #[test]
    fn test_other_bets_are_untouched() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        apply(&engine, 1, &[LedgerInstruction::stake(Money::new(dec!(-10)))]).unwrap();
        apply(&engine, 2, &[LedgerInstruction::stake(Money::new(dec!(-20)))]).unwrap();
        apply(&engine, 1, &[LedgerInstruction::stake(Money::ZERO)]).unwrap();

        assert_eq!(balance(&store, platform), Money::new(dec!(80)));
        let transactions = store.transactions_for_platform(platform);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].bet, 2);
    }

    #[test]
    fn test_unknown_platform_is_skipped() {
        let (engine, store, platform) = setup(Money::new(dec!(100)));

        let outcome = engine
            .apply(LedgerRequest {
                user: 1,
                platform: PlatformRef::Name("Nowhere"),
                bet: 1,
                instructions: &[LedgerInstruction::stake(Money::new(dec!(-10)))],
                effective_at: Utc::now(),
                context: "test",
            })
            .unwrap();

        assert_eq!(
            outcome,
            LedgerOutcome::Skipped(SkipReason::UnknownPlatformName("Nowhere".to_string()))
        );
        assert_eq!(balance(&store, platform), Money::new(dec!(100)));
    }

    #[test]
    fn test_empty_instructions_are_unchanged() {
        let (engine, _store, _platform) = setup(Money::new(dec!(100)));
        assert_eq!(apply(&engine, 1, &[]).unwrap(), LedgerOutcome::Unchanged);
    }

    #[test]
    fn test_overflow_rolls_back_every_instruction() {
        let (engine, store, platform) = setup(Money::new(rust_decimal::Decimal::MAX));

        let result = apply(
            &engine,
            1,
            &[
                LedgerInstruction::stake(Money::new(dec!(-10))),
                LedgerInstruction::settlement(Money::new(dec!(20))),
            ],
        );

        assert!(matches!(
            result,
            Err(LedgerError::LedgerWriteFailed { .. })
        ));
        assert_eq!(
            balance(&store, platform),
            Money::new(rust_decimal::Decimal::MAX)
        );
        assert!(store.transactions_for_platform(platform).is_empty());
    }
}
