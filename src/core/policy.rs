//! Settlement policy
//!
//! Pure functions deciding which ledger entries a bet must carry after it is
//! created or edited. They never touch a store.
//!
//! An instruction names a slot and the signed amount that slot must hold after
//! the ledger call. The reversal engine removes whatever the slot held before,
//! so the balance moves by `new - old`:
//!
//! | Mode | Change | Instruction | Balance moves by |
//! |---|---|---|---|
//! | immediate | created | stake = -stake | -stake |
//! | immediate | pending -> won | settlement = +payout | +payout |
//! | immediate | pending -> lost | none | 0 |
//! | immediate | won -> lost | settlement = 0 | -payout |
//! | immediate | lost -> won | settlement = +payout | +payout |
//! | on_loss | created | none | 0 |
//! | on_loss | -> won | settlement = payout - stake | +profit |
//! | on_loss | -> lost | settlement = -stake | -stake |
//! | on_loss | won <-> lost | new settlement | new profit - old profit |
//!
//! Refunds return the stake in `immediate` mode and book nothing in `on_loss`
//! mode. Moving a settled bet back to pending clears its settlement entry.
//!
//! `mode` is always the mode the bet was created under (`Bet::mode`), never the
//! user's current setting: the slots a bet already holds were booked under it.

use crate::types::{BankrollMode, Bet, BetStatus, EntrySlot, LedgerError, Money};

/// Signed amount a bet's ledger slot must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerInstruction {
    pub slot: EntrySlot,
    pub amount: Money,
}

impl LedgerInstruction {
    pub fn stake(amount: Money) -> Self {
        LedgerInstruction {
            slot: EntrySlot::Stake,
            amount,
        }
    }

    pub fn settlement(amount: Money) -> Self {
        LedgerInstruction {
            slot: EntrySlot::Settlement,
            amount,
        }
    }
}

/// Instructions for a newly created bet
///
/// A bet created already settled is treated as created pending and then settled.
///
/// # Errors
///
/// - `MissingPayout` if the bet is created as won without a payout
pub fn on_create(mode: BankrollMode, bet: &Bet) -> Result<Vec<LedgerInstruction>, LedgerError> {
    let mut plan = Vec::with_capacity(2);

    if mode == BankrollMode::Immediate {
        plan.push(LedgerInstruction::stake(-bet.stake));
    }

    if let Some(instruction) = settlement(mode, BetStatus::Pending, bet)? {
        plan.push(instruction);
    }

    Ok(plan)
}

/// Instructions for an edit from `before` to `after`
///
/// In `immediate` mode a changed stake re-deducts the new stake.
///
/// A won bet needs a payout in both modes. `immediate` mode credits the payout
/// itself, so it is stricter here than an `on_loss`-only check would be.
///
/// # Errors
///
/// - `MissingPayout` if `after` is won without a payout, in either mode
pub fn on_transition(
    mode: BankrollMode,
    before: &Bet,
    after: &Bet,
) -> Result<Vec<LedgerInstruction>, LedgerError> {
    let mut plan = Vec::with_capacity(2);

    if mode == BankrollMode::Immediate && after.stake != before.stake {
        plan.push(LedgerInstruction::stake(-after.stake));
    }

    if let Some(instruction) = settlement(mode, before.status, after)? {
        plan.push(instruction);
    }

    Ok(plan)
}

fn settlement(
    mode: BankrollMode,
    from: BetStatus,
    after: &Bet,
) -> Result<Option<LedgerInstruction>, LedgerError> {
    use BankrollMode::{Immediate, OnLoss};
    use BetStatus::{Lost, Pending, Refunded, Won};

    let amount = match (mode, from, after.status) {
        (_, Pending, Pending) => None,

        // Stake was deducted at creation; a loss adds nothing.
        (Immediate, Pending | Lost, Lost) => None,
        (Immediate, Won | Refunded, Lost) => Some(Money::ZERO),
        (Immediate, _, Won) => Some(payout(after)?),
        (Immediate, _, Refunded) => Some(after.stake),
        (Immediate, Won | Lost | Refunded, Pending) => Some(Money::ZERO),

        (OnLoss, _, Won) => Some(win_profit(after)?),
        (OnLoss, _, Lost) => Some(-after.stake),
        (OnLoss, _, Refunded) => Some(Money::ZERO),
        (OnLoss, Won | Lost | Refunded, Pending) => Some(Money::ZERO),
    };

    Ok(amount.map(LedgerInstruction::settlement))
}

fn payout(bet: &Bet) -> Result<Money, LedgerError> {
    bet.payout.ok_or_else(|| LedgerError::missing_payout(bet.id))
}

fn win_profit(bet: &Bet) -> Result<Money, LedgerError> {
    payout(bet)?
        .checked_sub(bet.stake)
        .ok_or_else(|| LedgerError::invalid_amount("profit", bet.stake.value()))
}
