//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::context::ContextRegistry;
use crate::services::catalog::{CatalogClient, StockLookup};
use crate::services::orders::{OrderError, OrderGateway, OrderServiceClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like configuration and service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn StockLookup>,
    orders: Arc<dyn OrderGateway>,
    contexts: ContextRegistry,
}

impl AppState {
    /// Create application state with HTTP clients built from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the order service client cannot be constructed
    /// (e.g. the API key contains invalid header characters).
    pub fn new(config: StorefrontConfig) -> Result<Self, OrderError> {
        let catalog = Arc::new(CatalogClient::new(&config.catalog));
        let orders = Arc::new(OrderServiceClient::new(&config.order_service)?);

        Ok(Self::with_clients(config, catalog, orders))
    }

    /// Create application state with explicit service implementations.
    ///
    /// Used by tests to inject fakes for the catalog and order service.
    #[must_use]
    pub fn with_clients(
        config: StorefrontConfig,
        catalog: Arc<dyn StockLookup>,
        orders: Arc<dyn OrderGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                orders,
                contexts: ContextRegistry::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog stock lookup.
    #[must_use]
    pub fn catalog(&self) -> &dyn StockLookup {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the order submission gateway.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderGateway {
        self.inner.orders.as_ref()
    }

    /// Get a reference to the per-shopper context registry.
    #[must_use]
    pub fn contexts(&self) -> &ContextRegistry {
        &self.inner.contexts
    }
}
