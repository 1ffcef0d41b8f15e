//! Bet service
//!
//! The operations the CRUD layer calls: create a bet, edit it, and enter a
//! manual result. Each operation validates its input, recomputes the bet's
//! payout and profit, asks the settlement policy for ledger instructions, and
//! hands them to the reversal engine. The bet record is saved only after the
//! ledger write committed, so a failed write leaves both the bankroll and the
//! bet as they were.
//!
//! Notifications, audit entries and enrichment run after the bet is saved and
//! cannot fail the operation.

use crate::core::collaborators::{BetQuota, Collaborators, Severity};
use crate::core::policy::{self, LedgerInstruction};
use crate::core::reversal::{LedgerOutcome, LedgerRequest, ReversalEngine};
use crate::core::traits::{BetStore, LedgerStore, PlatformRef};
use crate::types::bet::{validate_payout_and_odds, validate_stake};
use crate::types::{
    BankrollMode, BankrollTransaction, Bet, BetId, BetInput, BetStatus, BetUpdate, LedgerError,
    ManualResult, Money, Platform, PlatformCategory, PlatformId, UserId,
};
use chrono::{DateTime, Datelike, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bet lifecycle operations over a store
pub struct BetService<S> {
    store: Arc<S>,
    reversal: ReversalEngine<S>,
    collaborators: Collaborators,
}

impl<S> Clone for BetService<S> {
    fn clone(&self) -> Self {
        BetService {
            store: Arc::clone(&self.store),
            reversal: self.reversal.clone(),
            collaborators: self.collaborators.clone(),
        }
    }
}

impl<S> std::fmt::Debug for BetService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BetService")
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore + BetStore> BetService<S> {
    /// Create a service with no-op collaborators
    pub fn new(store: Arc<S>) -> Self {
        Self::with_collaborators(store, Collaborators::default())
    }

    pub fn with_collaborators(store: Arc<S>, collaborators: Collaborators) -> Self {
        BetService {
            reversal: ReversalEngine::new(Arc::clone(&store)),
            store,
            collaborators,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Open a platform with its initial balance
    ///
    /// # Errors
    ///
    /// - `DuplicatePlatform` if the user already has a platform with this name
    /// - `InvalidAmount` if the initial balance is negative
    pub fn open_platform(
        &self,
        user: UserId,
        name: &str,
        category: PlatformCategory,
        initial_balance: Money,
    ) -> Result<Platform, LedgerError> {
        if initial_balance.is_negative() {
            return Err(LedgerError::invalid_amount(
                "initial balance",
                initial_balance.value(),
            ));
        }

        let platform = self
            .store
            .open_platform(user, name, category, initial_balance)?;

        info!(
            user,
            platform = platform.id,
            name,
            initial = %initial_balance,
            "platform opened"
        );

        Ok(platform)
    }

    /// Change the user's bankroll mode
    ///
    /// Only bets created from now on follow the new mode; existing bets keep theirs.
    pub fn set_bankroll_mode(&self, user: UserId, mode: BankrollMode) {
        self.store.set_bankroll_mode(user, mode);
        info!(user, %mode, "bankroll mode changed");
    }

    pub fn bankroll_mode(&self, user: UserId) -> BankrollMode {
        self.store.bankroll_mode(user)
    }

    /// Look up one of the user's platforms
    pub fn platform(&self, user: UserId, platform: PlatformRef<'_>) -> Option<Platform> {
        self.store.find_platform(user, platform)
    }

    pub fn platforms_for_user(&self, user: UserId) -> Vec<Platform> {
        self.store.platforms_for_user(user)
    }

    /// Live ledger transactions of a platform the user owns
    ///
    /// Empty if the platform does not exist or belongs to someone else.
    pub fn transactions_for_platform(
        &self,
        user: UserId,
        platform: PlatformId,
    ) -> Vec<BankrollTransaction> {
        match self.store.find_platform(user, PlatformRef::Id(platform)) {
            Some(platform) => self.store.transactions_for_platform(platform.id),
            None => Vec::new(),
        }
    }

    /// Fetch a bet owned by `user`
    ///
    /// # Errors
    ///
    /// - `BetNotFound` if the bet does not exist or belongs to another user
    pub fn get_bet(&self, user: UserId, bet: BetId) -> Result<Bet, LedgerError> {
        self.store
            .get_bet(user, bet)
            .ok_or_else(|| LedgerError::bet_not_found(user, bet))
    }

    /// Create a bet and apply its ledger effect
    ///
    /// A bet created directly as won, lost or refunded is booked as if it had
    /// been created pending and then settled.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive stake, negative payout or non-positive odds
    /// - `QuotaExceeded` if the user reached the monthly bet limit
    /// - `DuplicateBet` if the user already has a bet with this id
    /// - `MissingPayout` if the bet is won without payout or odds
    /// - `LedgerWriteFailed` if the ledger write was rolled back
    pub fn create_bet(&self, user: UserId, input: BetInput) -> Result<Bet, LedgerError> {
        validate_stake(input.stake)?;
        validate_payout_and_odds(input.payout, input.odds)?;

        let placed_at = input.placed_at.unwrap_or_else(Utc::now);
        self.check_quota(user, placed_at)?;

        if self.store.get_bet(user, input.id).is_some() {
            return Err(LedgerError::duplicate_bet(input.id));
        }

        let mode = self.store.bankroll_mode(user);
        let platform = self
            .store
            .find_platform(user, PlatformRef::Name(&input.platform));

        // Unknown platforms have no result feed either.
        let manual_platform = platform
            .as_ref()
            .map_or(true, |platform| platform.category.requires_manual_results());

        let mut bet = Bet {
            id: input.id,
            user,
            placed_at,
            label: input.label,
            stake: input.stake,
            payout: input.payout,
            profit: None,
            odds: input.odds,
            status: input.status,
            mode,
            platform_name: input.platform,
            platform_id: platform.map(|platform| platform.id),
            requires_manual_update: manual_platform && !input.status.is_settled(),
        };
        bet.recompute_amounts(BetStatus::Pending, input.payout, input.odds)?;

        let plan = policy::on_create(mode, &bet)?;
        let outcome = self.apply_ledger(&bet, &plan)?;

        if let Err(e) = self.store.insert_bet(bet.clone()) {
            // Lost a race on the id after the ledger committed; take the entries back out.
            self.undo_ledger(&bet, &plan);
            return Err(e);
        }

        info!(
            user,
            bet = bet.id,
            status = %bet.status,
            stake = %bet.stake,
            %mode,
            "bet created"
        );
        self.log_outcome(&bet, &outcome);

        self.collaborators.notifier.notify(
            user,
            Severity::Info,
            "Bet recorded",
            &format!("Bet #{} of {} on {} recorded", bet.id, bet.stake, bet.platform_name),
            &bet_link(bet.id),
        );
        if bet.status.is_settled() {
            self.notify_settlement(&bet);
        }
        self.audit(user, "bet.create", &bet, None);
        self.collaborators.enricher.enrich(&bet);

        Ok(bet)
    }

    /// Edit a bet's stake, payout, odds or status
    ///
    /// Any status change is allowed, including corrections between settled
    /// states and back to pending. The ledger is brought in line with the new
    /// state by reversing the bet's previous entries.
    ///
    /// # Errors
    ///
    /// - `BetNotFound` if the bet does not exist or belongs to another user
    /// - `InvalidAmount` for a non-positive stake, negative payout or non-positive odds
    /// - `MissingPayout` if the bet becomes won without payout or odds
    /// - `LedgerWriteFailed` if the ledger write was rolled back
    pub fn update_bet(
        &self,
        user: UserId,
        bet: BetId,
        update: BetUpdate,
    ) -> Result<Bet, LedgerError> {
        let before = self.get_bet(user, bet)?;

        if let Some(stake) = update.stake {
            validate_stake(stake)?;
        }
        validate_payout_and_odds(update.payout, update.odds)?;

        let mut after = before.clone();
        if let Some(stake) = update.stake {
            after.stake = stake;
        }
        if let Some(odds) = update.odds {
            after.odds = Some(odds);
        }
        if let Some(status) = update.status {
            after.status = status;
        }
        after.recompute_amounts(before.status, update.payout, update.odds)?;

        self.commit(before, after, "bet.update")
    }

    /// Enter the result of a pending bet by hand
    ///
    /// The payout is the explicit one if given, otherwise `stake × final_odds`,
    /// otherwise the payout already on the bet.
    ///
    /// # Errors
    ///
    /// - `BetNotFound` if the bet does not exist or belongs to another user
    /// - `BetNotPending` if the bet already has an outcome
    /// - `InvalidStatus` if the result is `pending`
    /// - `MissingPayout` if the result is won without payout or odds
    /// - `LedgerWriteFailed` if the ledger write was rolled back
    pub fn update_bet_result(
        &self,
        user: UserId,
        bet: BetId,
        result: ManualResult,
    ) -> Result<Bet, LedgerError> {
        let before = self.get_bet(user, bet)?;

        if before.status.is_settled() {
            return Err(LedgerError::bet_not_pending(bet, before.status));
        }
        if !result.status.is_settled() {
            return Err(LedgerError::invalid_status(&result.status.to_string()));
        }
        validate_payout_and_odds(result.payout, result.final_odds)?;

        let mut after = before.clone();
        after.status = result.status;
        if let Some(odds) = result.final_odds {
            after.odds = Some(odds);
        }
        after.recompute_amounts(before.status, result.payout, result.final_odds)?;

        self.commit(before, after, "bet.result")
    }

    fn check_quota(&self, user: UserId, placed_at: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.collaborators.quota.monthly_limit(user) {
            BetQuota::Unlimited => Ok(()),
            BetQuota::Limited(limit) => {
                let placed =
                    self.store
                        .count_bets_in_month(user, placed_at.year(), placed_at.month());
                if placed >= limit as usize {
                    Err(LedgerError::quota_exceeded(user, limit))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Apply the ledger effect of `before -> after`, then save `after`
    ///
    /// The bet's own mode decides the effect. A bet whose platform never
    /// resolved holds no entries yet, so it is booked in full from its current
    /// state, as if created now.
    fn commit(&self, before: Bet, mut after: Bet, action: &str) -> Result<Bet, LedgerError> {
        let mode = before.mode;
        let plan = match before.platform_id {
            Some(_) => policy::on_transition(mode, &before, &after)?,
            None => policy::on_create(mode, &after)?,
        };
        let outcome = self.apply_ledger(&after, &plan)?;

        if before.platform_id.is_none() {
            if let Some(platform) = outcome.platform() {
                info!(
                    user = after.user,
                    bet = after.id,
                    platform,
                    "platform resolved late, bet booked in full"
                );
            }
        }

        if after.platform_id.is_none() {
            after.platform_id = outcome.platform();
        }
        if !before.status.is_settled() && after.status.is_settled() {
            after.requires_manual_update = false;
        }

        self.store.save_bet(after.clone());

        info!(
            user = after.user,
            bet = after.id,
            from = %before.status,
            to = %after.status,
            %mode,
            action,
            "bet updated"
        );
        self.log_outcome(&after, &outcome);

        if before.status != after.status {
            if before.status.is_settled() {
                self.collaborators.notifier.notify(
                    after.user,
                    Severity::Info,
                    "Bet corrected",
                    &format!(
                        "Bet #{} changed from {} to {}",
                        after.id, before.status, after.status
                    ),
                    &bet_link(after.id),
                );
            } else {
                self.notify_settlement(&after);
            }
        }
        self.audit(after.user, action, &after, Some(before.status));

        Ok(after)
    }

    fn apply_ledger(
        &self,
        bet: &Bet,
        instructions: &[LedgerInstruction],
    ) -> Result<LedgerOutcome, LedgerError> {
        let context = bet.status.to_string();
        self.reversal.apply(LedgerRequest {
            user: bet.user,
            platform: platform_ref(bet),
            bet: bet.id,
            instructions,
            effective_at: Utc::now(),
            context: &context,
        })
    }

    fn undo_ledger(&self, bet: &Bet, applied: &[LedgerInstruction]) {
        let cleared: Vec<LedgerInstruction> = applied
            .iter()
            .map(|instruction| LedgerInstruction {
                slot: instruction.slot,
                amount: Money::ZERO,
            })
            .collect();

        if let Err(e) = self.apply_ledger(bet, &cleared) {
            warn!(bet = bet.id, error = %e, "could not clear ledger entries of rejected bet");
        }
    }

    fn log_outcome(&self, bet: &Bet, outcome: &LedgerOutcome) {
        match outcome {
            LedgerOutcome::Skipped(reason) => {
                debug!(bet = bet.id, ?reason, "bet saved without ledger effect");
            }
            LedgerOutcome::Applied(receipt) => {
                debug!(
                    bet = bet.id,
                    platform = receipt.platform,
                    movement = %receipt.movement(),
                    "ledger effect applied"
                );
            }
            LedgerOutcome::Unchanged => {}
        }
    }

    fn notify_settlement(&self, bet: &Bet) {
        let (severity, title) = match bet.status {
            BetStatus::Won => (Severity::Success, "Bet won"),
            BetStatus::Lost => (Severity::Warning, "Bet lost"),
            BetStatus::Refunded => (Severity::Info, "Bet refunded"),
            BetStatus::Pending => return,
        };
        let profit = bet.profit.unwrap_or(Money::ZERO);

        self.collaborators.notifier.notify(
            bet.user,
            severity,
            title,
            &format!("Bet #{} settled with a profit of {:.2}", bet.id, profit),
            &bet_link(bet.id),
        );
    }

    fn audit(&self, user: UserId, action: &str, bet: &Bet, old_status: Option<BetStatus>) {
        self.collaborators.audit.record(
            user,
            action,
            "bet",
            &bet.id.to_string(),
            json!({
                "old_status": old_status,
                "new_status": bet.status,
                "profit": bet.profit,
            }),
        );
    }
}

fn platform_ref(bet: &Bet) -> PlatformRef<'_> {
    match bet.platform_id {
        Some(id) => PlatformRef::Id(id),
        None => PlatformRef::Name(&bet.platform_name),
    }
}

fn bet_link(bet: BetId) -> String {
    format!("/bets/{}", bet)
}
