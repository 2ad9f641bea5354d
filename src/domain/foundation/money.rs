//! Money value object: non-negative decimal amount in a two-decimal currency.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use super::ValidationError;

/// Decimal places kept for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a raw decimal to cents, midpoint away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A non-negative amount of money, always held at cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount, rounding to cents and rejecting negatives.
    pub fn try_new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::negative("amount", value));
        }
        Ok(Self(round_cents(value)))
    }

    /// Creates an amount from provider minor units (cents).
    ///
    /// Negative inputs clamp to zero.
    pub fn from_minor_units(minor: i64) -> Self {
        Self(Decimal::new(minor.max(0), MONEY_SCALE))
    }

    /// Returns the amount in minor units (cents).
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    pub fn to_minor_units(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).trunc().to_i64()
    }

    /// Returns the inner decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtracts, flooring at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        if other.0 >= self.0 {
            Money::ZERO
        } else {
            Money(self.0 - other.0)
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Money {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::try_new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

/// Saturating: money never goes negative.
impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        self.saturating_sub(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn try_new_rounds_to_cents() {
        let money = Money::try_new(dec!(10.005)).unwrap();
        assert_eq!(money.amount(), dec!(10.01));
    }

    #[test]
    fn try_new_rejects_negative() {
        assert!(matches!(
            Money::try_new(dec!(-0.01)),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn minor_units_conversion() {
        let money = Money::try_new(dec!(49.99)).unwrap();
        assert_eq!(money.to_minor_units(), Some(4999));
        assert_eq!(Money::from_minor_units(4999), money);
    }

    #[test]
    fn subtraction_floors_at_zero() {
        let a = Money::try_new(dec!(10)).unwrap();
        let b = Money::try_new(dec!(25)).unwrap();
        assert_eq!(a - b, Money::ZERO);
        assert_eq!(b - a, Money::try_new(dec!(15)).unwrap());
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::try_new(dec!(75)).unwrap().to_string(), "75.00");
    }

    #[test]
    fn deserializes_from_decimal_string_and_rejects_negative() {
        let money: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(money.amount(), dec!(12.50));
        assert!(serde_json::from_str::<Money>("\"-1\"").is_err());
    }
}
