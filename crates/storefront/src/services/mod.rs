//! Clients for external collaborators.
//!
//! The storefront never owns catalog stock or order creation; both live
//! behind HTTP APIs. Each client is exposed through a trait so handlers can
//! be exercised with in-process fakes.

pub mod catalog;
pub mod orders;

pub use catalog::{CatalogClient, CatalogError, StockLookup};
pub use orders::{OrderGateway, OrderRequest, OrderResult, OrderServiceClient};
