//! Variant identity types.
//!
//! A variant is a specific purchasable size/color configuration of a product.
//! `VariantKey` is the explicit composite key the cart deduplicates on -
//! never an ad hoc string concatenation, which invites collision and
//! formatting bugs across locales.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A regionally encoded garment size (e.g., "M", "XL", "UK 10", "38").
///
/// Kept opaque: size-chart conversion is a separate static lookup and not a
/// concern of cart or checkout logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(String);

impl Size {
    /// Create a size from its regional encoding.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The size label as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Size {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

/// Composite identity of a purchasable variant: product + size + color.
///
/// Two cart additions with equal keys merge into one line; unequal keys
/// produce separate lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub size: Size,
    pub color: Option<String>,
}

impl VariantKey {
    /// Create a variant key.
    #[must_use]
    pub fn new(product_id: ProductId, size: Size, color: Option<String>) -> Self {
        Self {
            product_id,
            size,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_keys_compare_equal() {
        let a = VariantKey::new(ProductId::new(1), Size::from("M"), Some("Indigo".to_string()));
        let b = VariantKey::new(ProductId::new(1), Size::from("M"), Some("Indigo".to_string()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_color_distinguishes_keys() {
        let a = VariantKey::new(ProductId::new(1), Size::from("M"), Some("Indigo".to_string()));
        let b = VariantKey::new(ProductId::new(1), Size::from("M"), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_concatenation_collision() {
        // "1" + "0M" and "10" + "M" would collide under naive string joining.
        let a = VariantKey::new(ProductId::new(1), Size::from("0M"), None);
        let b = VariantKey::new(ProductId::new(10), Size::from("M"), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_size_display() {
        assert_eq!(Size::from("UK 10").to_string(), "UK 10");
    }
}
