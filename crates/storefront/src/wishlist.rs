//! Wishlist store.
//!
//! Structurally a sibling of the cart, keyed by product identity only.
//! No variant or stock dimension - saving a product for later needs neither
//! a size selection nor an availability check.

use banyan_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// A saved product with its display-time snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub image_url: String,
}

/// An ordered collection of saved products, unique per product id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The saved items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    /// Number of saved products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the wishlist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the product is saved.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    /// Save a product. Re-saving an already saved product is a no-op.
    pub fn add_item(&mut self, item: WishlistItem) {
        if !self.contains(item.product_id) {
            self.items.push(item);
        }
    }

    /// Remove a saved product. Returns whether it was present.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.items.len() != before
    }

    /// Remove all saved products.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
