//! Monetary value type for the bankroll ledger
//!
//! Every stake, payout, profit and balance in the crate is a [`Money`]. It wraps
//! a `rust_decimal::Decimal` so that repeated reverse-then-reapply cycles on the
//! same balance are exact: adding an amount and subtracting it again always
//! yields the original value, with no drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Fixed-precision monetary amount
///
/// Arithmetic is checked: overflow returns `None` instead of panicking so the
/// caller can abort the surrounding ledger write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal value
    pub const fn new(value: Decimal) -> Self {
        Money(value)
    }

    /// The underlying decimal value
    pub const fn value(self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiply by decimal odds (`stake × odds`)
    pub fn checked_mul(self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Strictly below zero
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Strictly above zero
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Money)
    }
}

impl fmt::Display for Money {
    // Forward so `{:.2}` reaches the decimal formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
