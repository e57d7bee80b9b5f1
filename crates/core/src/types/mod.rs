//! Shared domain types.

pub mod id;
pub mod money;
pub mod variant;

pub use id::*;
pub use money::{CurrencyCode, MoneyError, Price};
pub use variant::{Size, VariantKey};
