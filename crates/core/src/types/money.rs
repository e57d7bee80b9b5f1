//! Type-safe price representation using decimal arithmetic.
//!
//! Display-time prices are fractional decimals (e.g. ₹129.99). Wire payloads
//! carry integer minor units (paise) to avoid floating-point rounding error;
//! the conversion rounds to the nearest integer, never truncates.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error converting a price to integer minor units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount does not fit in an i64 of minor units.
    #[error("amount out of range for minor units: {0}")]
    OutOfRange(Decimal),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from integer minor units (e.g., 12999 paise -> ₹129.99).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(minor, currency_code.minor_unit_exponent()),
            currency_code,
        }
    }

    /// Convert to integer minor units, rounding to the nearest integer.
    ///
    /// Midpoints round away from zero, so ₹0.005 becomes 1 paisa. Truncation
    /// is never used; it would systematically lose value on fractional
    /// display prices.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::OutOfRange`] if the scaled amount does not fit
    /// in an `i64`.
    pub fn minor_units(&self) -> Result<i64, MoneyError> {
        let scale = Decimal::from(10_i64.pow(self.currency_code.minor_unit_exponent()));
        self.amount
            .checked_mul(scale)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|scaled| scaled.to_i64())
            .ok_or(MoneyError::OutOfRange(self.amount))
    }

    /// Format for display (e.g., "₹129.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Decimal places in the currency's minor unit (paise, cents, pence).
    #[must_use]
    pub const fn minor_unit_exponent(self) -> u32 {
        match self {
            Self::INR | Self::USD | Self::EUR | Self::GBP => 2,
        }
    }

    /// Currency symbol for display formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}
