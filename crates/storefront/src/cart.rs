//! Stock-aware cart store.
//!
//! The cart owns an ordered set of line items deduplicated on
//! [`VariantKey`]. Totals are always derived from the lines - item count and
//! subtotal are never stored as separate mutable fields, so they cannot
//! drift.
//!
//! Every mutation takes the authoritative remaining-stock count read
//! immediately beforehand. The store never caches stock: the caller performs
//! the read, maps a failed read to [`CartError::StockUnavailable`], and only
//! then mutates. A mutation that would exceed stock is rejected atomically -
//! the cart is left exactly as it was.

use banyan_core::{OptionId, Price, ProductId, Size, VariantId, VariantKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The variant has no size selected. A validation failure, not a stock
    /// failure.
    #[error("no size selected for product {0}")]
    NoSizeSelected(ProductId),

    /// The requested quantity exceeds remaining stock.
    #[error("insufficient stock: requested {requested}, only {remaining} remaining")]
    InsufficientStock { requested: u32, remaining: u32 },

    /// The authoritative stock source could not be read. An unreachable
    /// stock source is never treated as infinite availability; it blocks the
    /// mutation with this explicit error.
    #[error("stock source unavailable: {0}")]
    StockUnavailable(String),

    /// Requested quantity was zero on an add.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// No line with the given id exists in the cart.
    #[error("cart line not found: {0}")]
    LineNotFound(Uuid),
}

/// A fully described variant selection from a product page.
///
/// `size` is optional here because selection happens client-side; the cart
/// enforces that a size was actually chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedVariant {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub option_id: Option<OptionId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub size: Option<Size>,
    pub color: Option<String>,
    pub unit_price: Price,
    pub image_url: String,
}

/// One cart line: a variant reference, its display-time snapshot, and a
/// quantity of at least 1. A line with quantity 0 does not exist - it is
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub key: VariantKey,
    pub variant_id: Option<VariantId>,
    pub option_id: Option<OptionId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub unit_price: Price,
    pub image_url: String,
    pub quantity: u32,
}

impl CartLine {
    /// Line total in the display currency.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// An ordered collection of cart lines, unique per variant identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across all lines. Always derived.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of `price x quantity` across all lines, in the display currency.
    /// Always derived.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Quantity of the given variant already held in the cart.
    #[must_use]
    pub fn quantity_of(&self, key: &VariantKey) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.key == key)
            .map_or(0, |line| line.quantity)
    }

    /// Look up a line by id.
    #[must_use]
    pub fn line(&self, line_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    /// Stock still addable for the variant: authoritative stock minus what
    /// the cart already holds. Saturates at zero - authoritative stock may
    /// have dropped below the held quantity since the item was added.
    #[must_use]
    pub fn remaining_stock(&self, key: &VariantKey, available: u32) -> u32 {
        available.saturating_sub(self.quantity_of(key))
    }

    /// Whether `requested` more units of the variant fit within remaining
    /// stock.
    #[must_use]
    pub fn can_add(&self, key: &VariantKey, requested: u32, available: u32) -> bool {
        requested <= self.remaining_stock(key, available)
    }

    /// Add `quantity` units of the variant, merging into an existing line
    /// for the same variant identity.
    ///
    /// `available` is the authoritative stock count read just before this
    /// call. The post-operation total for the variant must not exceed it.
    ///
    /// Returns the id of the inserted or merged line.
    ///
    /// # Errors
    ///
    /// - [`CartError::NoSizeSelected`] if the variant has no size; the cart
    ///   only holds fully specified variants.
    /// - [`CartError::ZeroQuantity`] if `quantity` is 0.
    /// - [`CartError::InsufficientStock`] if `held + quantity > available`.
    ///   The cart is left unchanged.
    pub fn add_item(
        &mut self,
        variant: SelectedVariant,
        quantity: u32,
        available: u32,
    ) -> Result<Uuid, CartError> {
        let SelectedVariant {
            product_id,
            variant_id,
            option_id,
            product_name,
            variant_name,
            size,
            color,
            unit_price,
            image_url,
        } = variant;

        let size = size.ok_or(CartError::NoSizeSelected(product_id))?;
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let key = VariantKey::new(product_id, size, color);
        let held = self.quantity_of(&key);
        // Compare in u64 so a pathological request cannot overflow.
        if u64::from(held) + u64::from(quantity) > u64::from(available) {
            return Err(CartError::InsufficientStock {
                requested: quantity,
                remaining: available.saturating_sub(held),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity += quantity;
            return Ok(line.id);
        }

        let id = Uuid::new_v4();
        self.lines.push(CartLine {
            id,
            key,
            variant_id,
            option_id,
            product_name,
            variant_name,
            unit_price,
            image_url,
            quantity,
        });
        Ok(id)
    }

    /// Set a line's quantity to an absolute value, re-validated against
    /// current stock. A quantity of 0 removes the line.
    ///
    /// The line's own held quantity is available to itself, so the check is
    /// simply `new_quantity <= available`.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`] if no line has the given id.
    /// - [`CartError::InsufficientStock`] if `new_quantity > available`.
    ///   The cart is left unchanged.
    pub fn update_quantity(
        &mut self,
        line_id: Uuid,
        new_quantity: u32,
        available: u32,
    ) -> Result<(), CartError> {
        if new_quantity == 0 {
            return self.remove_item(line_id);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;

        if new_quantity > available {
            return Err(CartError::InsufficientStock {
                requested: new_quantity,
                remaining: available,
            });
        }

        line.quantity = new_quantity;
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has the given id.
    pub fn remove_item(&mut self, line_id: Uuid) -> Result<(), CartError> {
        let position = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;
        self.lines.remove(position);
        Ok(())
    }

    /// Empty the cart. Called after a confirmed order success, or by the
    /// explicit clear action - never optimistically before submission.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use banyan_core::CurrencyCode;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap(), CurrencyCode::INR)
    }

    fn kurta(size: Option<&str>, color: Option<&str>) -> SelectedVariant {
        SelectedVariant {
            product_id: ProductId::new(11),
            variant_id: Some(VariantId::new(111)),
            option_id: None,
            product_name: "Block Print Kurta".to_string(),
            variant_name: Some("Block Print Kurta - Indigo".to_string()),
            size: size.map(Size::from),
            color: color.map(String::from),
            unit_price: price("129.99"),
            image_url: "https://cdn.example.in/kurta-indigo.jpg".to_string(),
        }
    }

    fn key_of(variant: &SelectedVariant) -> VariantKey {
        VariantKey::new(
            variant.product_id,
            variant.size.clone().unwrap(),
            variant.color.clone(),
        )
    }

    #[test]
    fn test_add_requires_size() {
        let mut cart = Cart::new();
        let err = cart.add_item(kurta(None, Some("Indigo")), 1, 10).unwrap_err();
        assert_eq!(err, CartError::NoSizeSelected(ProductId::new(11)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let err = cart.add_item(kurta(Some("M"), None), 0, 10).unwrap_err();
        assert_eq!(err, CartError::ZeroQuantity);
    }

    #[test]
    fn test_add_merges_on_same_variant_key() {
        let mut cart = Cart::new();
        let first = cart.add_item(kurta(Some("M"), Some("Indigo")), 1, 10).unwrap();
        let second = cart.add_item(kurta(Some("M"), Some("Indigo")), 2, 10).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_different_sizes_make_separate_lines() {
        let mut cart = Cart::new();
        cart.add_item(kurta(Some("M"), None), 1, 10).unwrap();
        cart.add_item(kurta(Some("L"), None), 1, 10).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_insufficient_stock_rejected_atomically() {
        // Authoritative stock 4, cart holds 2; adding 3 would total 5.
        let mut cart = Cart::new();
        cart.add_item(kurta(Some("M"), None), 2, 4).unwrap();
        let before = cart.clone();

        let err = cart.add_item(kurta(Some("M"), None), 3, 4).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remaining_stock_never_negative() {
        // Stock dropped to 1 after the shopper added 2.
        let mut cart = Cart::new();
        let variant = kurta(Some("M"), None);
        let key = key_of(&variant);
        cart.add_item(variant, 2, 5).unwrap();

        assert_eq!(cart.remaining_stock(&key, 1), 0);
        assert!(!cart.can_add(&key, 1, 1));
    }

    #[test]
    fn test_can_add_within_remaining() {
        let mut cart = Cart::new();
        let variant = kurta(Some("M"), None);
        let key = key_of(&variant);
        cart.add_item(variant, 2, 4).unwrap();

        assert!(cart.can_add(&key, 2, 4));
        assert!(!cart.can_add(&key, 3, 4));
    }

    #[test]
    fn test_derived_totals_track_mutations() {
        let mut cart = Cart::new();
        let line = cart.add_item(kurta(Some("M"), None), 2, 10).unwrap();
        cart.add_item(kurta(Some("L"), None), 1, 10).unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), "389.97".parse::<Decimal>().unwrap());

        cart.update_quantity(line, 1, 10).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal(), "259.98".parse::<Decimal>().unwrap());

        cart.remove_item(line).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal(), "129.99".parse::<Decimal>().unwrap());

        assert!(cart.lines().iter().all(|line| line.quantity >= 1));
    }

    #[test]
    fn test_update_quantity_revalidates_stock() {
        let mut cart = Cart::new();
        let line = cart.add_item(kurta(Some("M"), None), 2, 4).unwrap();

        // The line's own 2 units are available to itself: 4 is fine, 5 is not.
        cart.update_quantity(line, 4, 4).unwrap();
        let err = cart.update_quantity(line, 5, 4).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                requested: 5,
                remaining: 4
            }
        );
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::new();
        let line = cart.add_item(kurta(Some("M"), None), 2, 4).unwrap();
        cart.update_quantity(line, 0, 4).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut cart = Cart::new();
        let missing = Uuid::new_v4();
        assert_eq!(
            cart.remove_item(missing).unwrap_err(),
            CartError::LineNotFound(missing)
        );
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_item(kurta(Some("M"), None), 2, 4).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }
}
