//! Price amounts.
//!
//! Prices are decimal amounts with at most two fractional digits. They are
//! stored as a whole number of cents so that ordering and equality are exact,
//! which the price index relies on for its key comparisons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::RecordError;

/// Number of cents in one whole currency unit.
const CENTS_PER_UNIT: u64 = 100;

/// Tolerance used when deciding whether an `f64` has at most two decimals.
const FRACTION_EPSILON: f64 = 1e-6;

/// A strictly positive price, in cents.
///
/// # Invariants
///
/// - The amount is always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Price(u64);

impl Price {
    /// The smallest representable price, one cent.
    pub const MIN: Self = Self(1);

    /// Create a price from a whole number of cents.
    ///
    /// # Examples
    ///
    /// ```
    /// use inventory::types::Price;
    /// let price = Price::from_cents(49_999).expect("positive");
    /// assert_eq!(price.to_string(), "499.99");
    /// ```
    pub const fn from_cents(cents: u64) -> Result<Self, RecordError> {
        if cents == 0 {
            return Err(RecordError::NonPositivePrice);
        }
        Ok(Self(cents))
    }

    /// Create a price from a floating point amount.
    ///
    /// The amount must be finite, positive and carry at most two fractional
    /// digits (`499.99` is accepted, `0.125` is not).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_f64(amount: f64) -> Result<Self, RecordError> {
        if !amount.is_finite() {
            return Err(RecordError::NonFinitePrice);
        }
        if amount <= 0.0 {
            return Err(RecordError::NonPositivePrice);
        }

        let scaled = amount * CENTS_PER_UNIT as f64;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > FRACTION_EPSILON {
            return Err(RecordError::ExcessPrecision(amount.to_string()));
        }
        if rounded >= u64::MAX as f64 {
            return Err(RecordError::PriceOutOfRange(amount.to_string()));
        }

        Self::from_cents(rounded as u64)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// The whole-unit part of the amount.
    #[must_use]
    pub const fn units(self) -> u64 {
        self.0 / CENTS_PER_UNIT
    }

    /// The fractional part of the amount, in cents (0-99).
    #[must_use]
    pub const fn fraction(self) -> u64 {
        self.0 % CENTS_PER_UNIT
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.units(), self.fraction())
    }
}

impl FromStr for Price {
    type Err = RecordError;

    /// Parse a decimal amount such as `"12"`, `"12.5"` or `"12.50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unparseable = || RecordError::UnparseablePrice(s.to_string());

        if trimmed.starts_with('-') {
            return Err(RecordError::NonPositivePrice);
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(unparseable());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(unparseable());
        }
        if fraction.len() > 2 {
            return Err(RecordError::ExcessPrecision(s.to_string()));
        }

        let units: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| RecordError::PriceOutOfRange(s.to_string()))?
        };
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| unparseable())? * 10,
            _ => fraction.parse().map_err(|_| unparseable())?,
        };

        let total = units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(cents))
            .ok_or_else(|| RecordError::PriceOutOfRange(s.to_string()))?;

        Self::from_cents(total)
    }
}

impl TryFrom<u64> for Price {
    type Error = RecordError;

    fn try_from(cents: u64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl From<Price> for u64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_rejects_zero() {
        assert_eq!(Price::from_cents(0), Err(RecordError::NonPositivePrice));
        assert_eq!(Price::from_cents(1).expect("one cent").cents(), 1);
    }

    #[test]
    fn test_parse_decimal_forms() {
        assert_eq!("12".parse::<Price>().expect("whole").cents(), 1200);
        assert_eq!("12.5".parse::<Price>().expect("one digit").cents(), 1250);
        assert_eq!("12.05".parse::<Price>().expect("two digits").cents(), 1205);
        assert_eq!(".99".parse::<Price>().expect("no units").cents(), 99);
        assert_eq!(" 499.99 ".parse::<Price>().expect("padded").cents(), 49_999);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "abc".parse::<Price>(),
            Err(RecordError::UnparseablePrice(_))
        ));
        assert!(matches!("".parse::<Price>(), Err(RecordError::UnparseablePrice(_))));
        assert!(matches!(".".parse::<Price>(), Err(RecordError::UnparseablePrice(_))));
        assert!(matches!(
            "1.234".parse::<Price>(),
            Err(RecordError::ExcessPrecision(_))
        ));
        assert_eq!("-5".parse::<Price>(), Err(RecordError::NonPositivePrice));
        assert_eq!("0.00".parse::<Price>(), Err(RecordError::NonPositivePrice));
        assert!(matches!(
            "99999999999999999999".parse::<Price>(),
            Err(RecordError::PriceOutOfRange(_))
        ));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(499.99).expect("valid").cents(), 49_999);
        assert_eq!(Price::from_f64(0.01).expect("valid").cents(), 1);
        assert_eq!(Price::from_f64(-100.0), Err(RecordError::NonPositivePrice));
        assert_eq!(Price::from_f64(0.0), Err(RecordError::NonPositivePrice));
        assert_eq!(Price::from_f64(f64::NAN), Err(RecordError::NonFinitePrice));
        assert_eq!(
            Price::from_f64(f64::INFINITY),
            Err(RecordError::NonFinitePrice)
        );
        assert!(matches!(
            Price::from_f64(0.125),
            Err(RecordError::ExcessPrecision(_))
        ));
    }

    #[test]
    fn test_display_pads_fraction() {
        assert_eq!(Price::from_cents(5).expect("valid").to_string(), "0.05");
        assert_eq!(Price::from_cents(1000).expect("valid").to_string(), "10.00");
    }

    #[test]
    fn test_deserialize_from_cents() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error, U64Deserializer};

        let cents: U64Deserializer<Error> = 1250u64.into_deserializer();
        assert_eq!(Price::deserialize(cents).expect("valid cents").to_string(), "12.50");

        let zero: U64Deserializer<Error> = 0u64.into_deserializer();
        let error = Price::deserialize(zero).expect_err("zero cents");
        assert_eq!(error.to_string(), RecordError::NonPositivePrice.to_string());
    }

    #[test]
    fn test_into_u64_is_cents() {
        assert_eq!(u64::from(Price::from_cents(999).expect("valid")), 999);
    }

    #[test]
    fn test_ordering_follows_amount() {
        let cheap = Price::from_cents(999).expect("valid");
        let dear = Price::from_cents(1000).expect("valid");
        assert!(cheap < dear);
    }
}
