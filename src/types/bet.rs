//! Bet-related types for the bankroll ledger
//!
//! This module defines the wager entity, its lifecycle status and the inputs
//! accepted by the create, update and manual-result operations.

use super::error::LedgerError;
use super::money::Money;
use super::platform::{BankrollMode, PlatformId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bet identifier
///
/// Chosen by the caller (the CRUD layer) and unique per user.
pub type BetId = u64;

/// Lifecycle status of a bet
///
/// Bets start `Pending` and settle into exactly one of the other three. Manual
/// correction may move a settled bet between the settled states, or back to
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    #[default]
    Pending,
    Won,
    Lost,
    Refunded,
}

impl BetStatus {
    /// Whether the bet has an outcome
    pub fn is_settled(self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Pending => write!(f, "pending"),
            BetStatus::Won => write!(f, "won"),
            BetStatus::Lost => write!(f, "lost"),
            BetStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for BetStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BetStatus::Pending),
            "won" | "win" => Ok(BetStatus::Won),
            "lost" | "loss" => Ok(BetStatus::Lost),
            "refunded" | "refund" | "void" => Ok(BetStatus::Refunded),
            _ => Err(LedgerError::invalid_status(s)),
        }
    }
}

/// A wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user: UserId,
    pub placed_at: DateTime<Utc>,

    /// Race or event description; not used by the ledger
    pub label: Option<String>,

    pub stake: Money,
    pub payout: Option<Money>,
    pub profit: Option<Money>,

    /// Final decimal odds, used to derive a payout when none is given
    pub odds: Option<Decimal>,

    pub status: BetStatus,

    /// Bankroll mode in force when the bet was created
    ///
    /// Every later ledger effect of the bet follows this mode, so a bet keeps
    /// matching its own entries when the user switches modes.
    #[serde(default)]
    pub mode: BankrollMode,

    /// Platform name as entered by the user (display only once resolved)
    pub platform_name: String,

    /// Stable platform id, resolved the first time the bet touches the ledger
    pub platform_id: Option<PlatformId>,

    pub requires_manual_update: bool,
}

impl Bet {
    /// Recompute payout and profit from the current status
    ///
    /// `explicit_payout` is a payout supplied with this change and `fresh_odds`
    /// odds supplied with it. A previously stored payout is only reused when the
    /// bet was already `Won` or `Pending` before the change (`previous`).
    ///
    /// # Errors
    ///
    /// - `MissingPayout` if the bet is `Won` and no payout or odds are available,
    ///   whatever the bankroll mode
    /// - `InvalidAmount` if the arithmetic overflows
    pub fn recompute_amounts(
        &mut self,
        previous: BetStatus,
        explicit_payout: Option<Money>,
        fresh_odds: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        match self.status {
            BetStatus::Won => {
                let carried = match previous {
                    BetStatus::Won | BetStatus::Pending => self.payout,
                    BetStatus::Lost | BetStatus::Refunded => None,
                };

                let payout = match (explicit_payout, fresh_odds, carried, self.odds) {
                    (Some(payout), _, _, _) => payout,
                    (None, Some(odds), _, _) => self.payout_from_odds(odds)?,
                    (None, None, Some(payout), _) => payout,
                    (None, None, None, Some(odds)) => self.payout_from_odds(odds)?,
                    (None, None, None, None) => return Err(LedgerError::missing_payout(self.id)),
                };

                self.payout = Some(payout);
                self.profit = Some(self.profit_for(payout)?);
            }
            BetStatus::Lost => {
                self.payout = None;
                self.profit = Some(-self.stake);
            }
            BetStatus::Refunded => {
                // Full stake return
                self.payout = Some(self.stake);
                self.profit = Some(Money::ZERO);
            }
            BetStatus::Pending => {
                if explicit_payout.is_some() {
                    self.payout = explicit_payout;
                }
                self.profit = match self.payout {
                    Some(payout) => Some(self.profit_for(payout)?),
                    None => None,
                };
            }
        }

        Ok(())
    }

    fn payout_from_odds(&self, odds: Decimal) -> Result<Money, LedgerError> {
        self.stake
            .checked_mul(odds)
            .ok_or_else(|| LedgerError::invalid_amount("payout", odds))
    }

    fn profit_for(&self, payout: Money) -> Result<Money, LedgerError> {
        payout
            .checked_sub(self.stake)
            .ok_or_else(|| LedgerError::invalid_amount("profit", payout.value()))
    }
}

/// Input for creating a bet
#[derive(Debug, Clone, PartialEq)]
pub struct BetInput {
    pub id: BetId,
    pub platform: String,
    pub stake: Money,
    pub payout: Option<Money>,
    pub odds: Option<Decimal>,
    pub status: BetStatus,
    pub label: Option<String>,

    /// Defaults to now
    pub placed_at: Option<DateTime<Utc>>,
}

impl BetInput {
    /// Pending bet with no payout or odds
    pub fn new(id: BetId, platform: impl Into<String>, stake: Money) -> Self {
        BetInput {
            id,
            platform: platform.into(),
            stake,
            payout: None,
            odds: None,
            status: BetStatus::Pending,
            label: None,
            placed_at: None,
        }
    }
}

/// Partial update of a bet; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetUpdate {
    pub stake: Option<Money>,
    pub payout: Option<Money>,
    pub odds: Option<Decimal>,
    pub status: Option<BetStatus>,
}

/// Result entered by hand for a bet on a platform without an automatic feed
#[derive(Debug, Clone, PartialEq)]
pub struct ManualResult {
    pub status: BetStatus,
    pub payout: Option<Money>,
    pub final_odds: Option<Decimal>,
}

/// Validate that a stake is strictly positive
pub fn validate_stake(stake: Money) -> Result<(), LedgerError> {
    if stake.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::invalid_amount("stake", stake.value()))
    }
}

/// Validate optional payout (non-negative) and odds (strictly positive)
pub fn validate_payout_and_odds(
    payout: Option<Money>,
    odds: Option<Decimal>,
) -> Result<(), LedgerError> {
    if let Some(payout) = payout {
        if payout.is_negative() {
            return Err(LedgerError::invalid_amount("payout", payout.value()));
        }
    }
    if let Some(odds) = odds {
        if odds <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("odds", odds));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn bet(status: BetStatus, stake: Decimal) -> Bet {
        Bet {
            id: 1,
            user: 1,
            placed_at: Utc::now(),
            label: None,
            stake: Money::new(stake),
            payout: None,
            profit: None,
            odds: None,
            status,
            mode: BankrollMode::Immediate,
            platform_name: "PMU".to_string(),
            platform_id: None,
            requires_manual_update: false,
        }
    }

    #[test]
    fn test_won_with_explicit_payout() {
        let mut bet = bet(BetStatus::Won, dec!(10));

        bet.recompute_amounts(BetStatus::Pending, Some(Money::new(dec!(35))), None)
            .unwrap();

        assert_eq!(bet.payout, Some(Money::new(dec!(35))));
        assert_eq!(bet.profit, Some(Money::new(dec!(25))));
    }

    #[test]
    fn test_won_from_odds() {
        let mut bet = bet(BetStatus::Won, dec!(10));

        bet.recompute_amounts(BetStatus::Pending, None, Some(dec!(4.2)))
            .unwrap();

        assert_eq!(bet.payout, Some(Money::new(dec!(42))));
        assert_eq!(bet.profit, Some(Money::new(dec!(32))));
    }

    #[test]
    fn test_won_from_stored_odds() {
        let mut bet = bet(BetStatus::Won, dec!(10));
        bet.odds = Some(dec!(2));

        bet.recompute_amounts(BetStatus::Pending, None, None).unwrap();

        assert_eq!(bet.payout, Some(Money::new(dec!(20))));
    }

    #[test]
    fn test_won_without_payout_or_odds_fails() {
        let mut bet = bet(BetStatus::Won, dec!(10));

        let result = bet.recompute_amounts(BetStatus::Pending, None, None);

        assert_eq!(result, Err(LedgerError::MissingPayout { bet: 1 }));
    }

    #[test]
    fn test_refunded_payout_is_not_reused_for_win() {
        let mut bet = bet(BetStatus::Won, dec!(10));
        bet.payout = Some(Money::new(dec!(10)));

        let result = bet.recompute_amounts(BetStatus::Refunded, None, None);

        assert!(matches!(result, Err(LedgerError::MissingPayout { .. })));
    }

    #[rstest]
    #[case::lost(BetStatus::Lost, None, dec!(-10))]
    #[case::refunded(BetStatus::Refunded, Some(dec!(10)), dec!(0))]
    fn test_terminal_amounts(
        #[case] status: BetStatus,
        #[case] expected_payout: Option<Decimal>,
        #[case] expected_profit: Decimal,
    ) {
        let mut bet = bet(status, dec!(10));
        bet.payout = Some(Money::new(dec!(50)));

        bet.recompute_amounts(BetStatus::Won, None, None).unwrap();

        assert_eq!(bet.payout, expected_payout.map(Money::new));
        assert_eq!(bet.profit, Some(Money::new(expected_profit)));
    }

    #[test]
    fn test_pending_profit_only_when_payout_known() {
        let mut bet = bet(BetStatus::Pending, dec!(10));
        bet.recompute_amounts(BetStatus::Pending, None, None).unwrap();
        assert_eq!(bet.profit, None);

        bet.recompute_amounts(BetStatus::Pending, Some(Money::new(dec!(18))), None)
            .unwrap();
        assert_eq!(bet.profit, Some(Money::new(dec!(8))));
    }

    #[rstest]
    #[case("pending", BetStatus::Pending)]
    #[case("WON", BetStatus::Won)]
    #[case(" lost ", BetStatus::Lost)]
    #[case("refunded", BetStatus::Refunded)]
    fn test_parse_status(#[case] input: &str, #[case] expected: BetStatus) {
        assert_eq!(input.parse::<BetStatus>().unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid_status() {
        assert!(matches!(
            "maybe".parse::<BetStatus>(),
            Err(LedgerError::InvalidStatus { .. })
        ));
    }

    #[rstest]
    #[case::zero(dec!(0))]
    #[case::negative(dec!(-5))]
    fn test_validate_stake_rejects_non_positive(#[case] stake: Decimal) {
        assert!(matches!(
            validate_stake(Money::new(stake)),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_payout_and_odds() {
        assert!(validate_payout_and_odds(Some(Money::ZERO), Some(dec!(1.5))).is_ok());
        assert!(validate_payout_and_odds(Some(Money::new(dec!(-1))), None).is_err());
        assert!(validate_payout_and_odds(None, Some(dec!(0))).is_err());
    }
}
