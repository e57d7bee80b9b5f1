//! Catalog stock lookup client.
//!
//! The catalog service owns authoritative remaining-quantity counts per
//! variant. Reads here are advisory - the order service arbitrates finally
//! at creation time - but a *failed* read is never softened into "infinite
//! stock"; it surfaces as an explicit error that blocks the cart mutation.

use async_trait::async_trait;
use banyan_core::{ProductId, Size};
use serde::Deserialize;
use thiserror::Error;

use crate::config::CatalogConfig;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Authoritative stock reads for a variant.
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Remaining quantity for the variant as the catalog currently knows it.
    async fn remaining_stock(
        &self,
        product_id: ProductId,
        size: &Size,
        color: Option<&str>,
    ) -> Result<u32, CatalogError>;
}

/// HTTP client for the catalog stock API.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Stock query response body.
#[derive(Debug, Deserialize)]
struct StockResponse {
    remaining: u32,
}

#[async_trait]
impl StockLookup for CatalogClient {
    async fn remaining_stock(
        &self,
        product_id: ProductId,
        size: &Size,
        color: Option<&str>,
    ) -> Result<u32, CatalogError> {
        let url = format!("{}/products/{product_id}/stock", self.base_url);

        let mut request = self.client.get(&url).query(&[("size", size.as_str())]);
        if let Some(color) = color {
            request = request.query(&[("color", color)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: StockResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        Ok(parsed.remaining)
    }
}
