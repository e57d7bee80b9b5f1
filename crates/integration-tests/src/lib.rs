//! Shared harness for in-process storefront API tests.
//!
//! Tests drive the full router (session layer included) through
//! `tower::ServiceExt::oneshot`, with the catalog and order service replaced
//! by configurable fakes. No network, no external services.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use banyan_core::{ProductId, Size};
use banyan_storefront::config::{CatalogConfig, OrderServiceConfig, StorefrontConfig};
use banyan_storefront::routes;
use banyan_storefront::services::catalog::{CatalogError, StockLookup};
use banyan_storefront::services::orders::{OrderError, OrderGateway, OrderRequest, OrderResult};
use banyan_storefront::state::AppState;
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::util::ServiceExt;

// =============================================================================
// Fake Services
// =============================================================================

/// In-memory stand-in for the catalog stock API.
#[derive(Default)]
pub struct FakeCatalog {
    stock: Mutex<HashMap<(ProductId, String, Option<String>), u32>>,
    unavailable: AtomicBool,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remaining stock for a variant.
    pub fn set_stock(&self, product_id: i64, size: &str, color: Option<&str>, remaining: u32) {
        self.stock.lock().unwrap().insert(
            (
                ProductId::new(product_id),
                size.to_string(),
                color.map(String::from),
            ),
            remaining,
        );
    }

    /// Make every stock read fail, simulating an unreachable catalog.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl StockLookup for FakeCatalog {
    async fn remaining_stock(
        &self,
        product_id: ProductId,
        size: &Size,
        color: Option<&str>,
    ) -> Result<u32, CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                status: 503,
                message: "warehouse sync in progress".to_string(),
            });
        }

        let key = (
            product_id,
            size.as_str().to_string(),
            color.map(String::from),
        );
        Ok(self.stock.lock().unwrap().get(&key).copied().unwrap_or(0))
    }
}

/// Configured outcome for the fake order gateway.
pub enum FakeOrderOutcome {
    Succeed,
    Unavailable,
    Reject(String),
}

/// In-memory stand-in for the order service.
///
/// Counts calls so tests can assert exactly how many order creation requests
/// were issued. An optional delay keeps a submission in flight long enough
/// for a concurrent duplicate to arrive.
pub struct FakeOrderGateway {
    calls: AtomicU32,
    delay: Option<Duration>,
    outcome: Mutex<FakeOrderOutcome>,
}

impl Default for FakeOrderGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOrderGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay: None,
            outcome: Mutex::new(FakeOrderOutcome::Succeed),
        }
    }

    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn set_outcome(&self, outcome: FakeOrderOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Number of order creation calls issued so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn confirmation(request: &OrderRequest) -> OrderResult {
        let subtotal: i64 = request
            .items
            .iter()
            .map(|item| item.unit_price * i64::from(item.quantity))
            .sum();
        let shipping_charge = 4900;
        OrderResult {
            order_number: "BN-10042".to_string(),
            created_at: chrono::Utc::now(),
            estimated_delivery: chrono::Utc::now() + chrono::Duration::days(5),
            subtotal,
            shipping_charge,
            discount_amount: 0,
            total_amount: subtotal + shipping_charge,
        }
    }
}

#[async_trait]
impl OrderGateway for FakeOrderGateway {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, OrderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &*self.outcome.lock().unwrap() {
            FakeOrderOutcome::Succeed => Ok(Self::confirmation(request)),
            FakeOrderOutcome::Unavailable => Err(OrderError::Unavailable {
                status: 502,
                message: "upstream timeout".to_string(),
            }),
            FakeOrderOutcome::Reject(message) => Err(OrderError::Rejected(message.clone())),
        }
    }
}

// =============================================================================
// Test Setup
// =============================================================================

/// A config pointing at nothing; the fakes never dial out.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        catalog: CatalogConfig {
            base_url: "http://catalog.invalid".to_string(),
        },
        order_service: OrderServiceConfig {
            base_url: "http://orders.invalid".to_string(),
            api_key: SecretString::from("k9fQ2mX7vL4pR8tB"),
        },
        sentry_dsn: None,
    }
}

/// Application state wired to the given fakes.
#[must_use]
pub fn test_state(
    catalog: std::sync::Arc<FakeCatalog>,
    orders: std::sync::Arc<FakeOrderGateway>,
) -> AppState {
    AppState::with_clients(test_config(), catalog, orders)
}

// =============================================================================
// Test Client
// =============================================================================

/// Drives the router in-process, persisting the session cookie between
/// requests like a browser would.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            app: routes::app(state),
            cookie: None,
        }
    }

    /// A clone of the router, for issuing concurrent requests manually.
    #[must_use]
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Build a request carrying the persisted session cookie.
    #[must_use]
    pub fn build_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Issue a request, persist any session cookie, and return the status
    /// with the parsed JSON body (`null` for empty bodies).
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = self.build_request(method, uri, body);
        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let cookie = set_cookie.to_str().unwrap();
            // Keep only the name=value pair.
            let pair = cookie.split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(
        &mut self,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", uri, body).await
    }

    pub async fn put(
        &mut self,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request("PUT", uri, body).await
    }

    pub async fn patch(
        &mut self,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request("PATCH", uri, body).await
    }

    pub async fn delete(&mut self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.request("DELETE", uri, None).await
    }
}

/// JSON body for adding the standard test kurta to the cart.
#[must_use]
pub fn kurta_body(size: Option<&str>, quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "product_id": 11,
        "variant_id": 111,
        "option_id": null,
        "product_name": "Block Print Kurta",
        "variant_name": "Block Print Kurta - Indigo",
        "size": size,
        "color": "Indigo",
        "unit_price": { "amount": "129.99", "currency_code": "INR" },
        "image_url": "https://cdn.example.in/kurta-indigo.jpg",
        "quantity": quantity,
    })
}

/// JSON body for valid delivery details.
#[must_use]
pub fn delivery_body() -> serde_json::Value {
    serde_json::json!({
        "full_name": "Asha Rao",
        "phone": "9820012345",
        "email": "asha@example.in",
        "address_line1": "14 Hill Road",
        "address_line2": null,
        "city": "Mumbai",
        "state": "Maharashtra",
        "postal_code": "400050",
        "notes": null,
    })
}
