//! Type-safe monetary amounts using decimal arithmetic.
//!
//! Amounts are always `rust_decimal::Decimal` - never floats. Arithmetic
//! across currencies is not implicit: [`Money::checked_add`] returns `None`
//! on a currency mismatch, and there is deliberately no conversion helper.
//! Currency conversion is the backend's job, not the storefront's.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Add two amounts of the same currency.
    ///
    /// Returns `None` when the currencies differ. Callers must treat a
    /// mismatch as a data problem to surface, not a conversion to perform.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        Some(Self {
            amount: self.amount.checked_add(other.amount)?,
            currency: self.currency,
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes supported by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// The currency symbol used for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// The three-letter ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl core::str::FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(UnknownCurrency(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_two_decimal_places() {
        let price = Money::new(dec!(19.9), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$19.90");

        let price = Money::new(dec!(450), CurrencyCode::GBP);
        assert_eq!(price.to_string(), "\u{a3}450.00");
    }

    #[test]
    fn test_checked_add_same_currency() {
        let subtotal = Money::new(dec!(450.00), CurrencyCode::USD);
        let shipping = Money::new(dec!(35.00), CurrencyCode::USD);
        let total = subtotal.checked_add(&shipping).expect("same currency");
        assert_eq!(total.amount, dec!(485.00));
        assert_eq!(total.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let subtotal = Money::new(dec!(450.00), CurrencyCode::USD);
        let shipping = Money::new(dec!(35.00), CurrencyCode::EUR);
        assert!(subtotal.checked_add(&shipping).is_none());
    }

    #[test]
    fn test_currency_round_trip() {
        for code in ["USD", "EUR", "GBP", "CAD", "AUD"] {
            let currency: CurrencyCode = code.parse().expect("known code");
            assert_eq!(currency.code(), code);
        }
        assert!("XTS".parse::<CurrencyCode>().is_err());
    }
}
