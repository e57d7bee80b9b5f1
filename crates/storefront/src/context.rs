//! Per-shopper server-side state.
//!
//! Each browser session maps to one [`ShopperContext`] keyed by a UUID stored
//! in the session. The registry is a concurrent map so handlers on different
//! sessions never contend.
//!
//! Lock discipline: a [`dashmap`] guard pins a shard. Handlers must drop the
//! guard before any `.await` (clone what they need out, re-enter after), or
//! a slow peer on the same shard deadlocks the executor.

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use uuid::Uuid;

use crate::cart::Cart;
use crate::checkout::CheckoutSession;
use crate::wishlist::Wishlist;

/// Everything the storefront tracks for a single shopper.
#[derive(Debug, Default)]
pub struct ShopperContext {
    /// Items staged for purchase.
    pub cart: Cart,
    /// Saved-for-later items.
    pub wishlist: Wishlist,
    /// Active checkout, if one has been started.
    pub checkout: Option<CheckoutSession>,
}

/// Concurrent registry of shopper contexts.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: DashMap<Uuid, ShopperContext>,
}

impl ContextRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a mutable guard for the shopper's context, creating an empty one
    /// on first access.
    ///
    /// The returned guard holds a shard lock; do not hold it across `.await`.
    pub fn entry(&self, id: Uuid) -> RefMut<'_, Uuid, ShopperContext> {
        self.contexts.entry(id).or_default()
    }

    /// Get a mutable guard only if the context exists.
    pub fn get_mut(&self, id: Uuid) -> Option<RefMut<'_, Uuid, ShopperContext>> {
        self.contexts.get_mut(&id)
    }

    /// Drop the shopper's context entirely.
    pub fn remove(&self, id: Uuid) {
        self.contexts.remove(&id);
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creates_empty_context() {
        let registry = ContextRegistry::new();
        let id = Uuid::new_v4();

        {
            let ctx = registry.entry(id);
            assert!(ctx.cart.is_empty());
            assert!(ctx.wishlist.is_empty());
            assert!(ctx.checkout.is_none());
        }

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let registry = ContextRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        registry.entry(a).checkout = Some(crate::checkout::CheckoutSession::new());

        assert!(registry.entry(a).checkout.is_some());
        assert!(registry.entry(b).checkout.is_none());
    }

    #[test]
    fn test_remove_drops_context() {
        let registry = ContextRegistry::new();
        let id = Uuid::new_v4();

        registry.entry(id);
        assert_eq!(registry.len(), 1);

        registry.remove(id);
        assert!(registry.is_empty());
        assert!(registry.get_mut(id).is_none());
    }
}
