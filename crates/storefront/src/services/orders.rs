//! Order submission client.
//!
//! Transforms the cart, delivery details, and optional customer identity
//! into the order service's wire payload and submits it. Money crosses the
//! wire only as integer minor units; the conversion rounds to nearest,
//! never truncates.
//!
//! Submission is at-most-once per user-triggered attempt: one POST, no
//! automatic retry. A user-initiated retry rebuilds the request fresh from
//! the then-current cart and details. Without an idempotency key the order
//! service may create duplicates on an ambiguous timeout; see DESIGN.md.

use async_trait::async_trait;
use banyan_core::{CustomerId, MoneyError, OptionId, ProductId, VariantId};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::Cart;
use crate::checkout::DeliveryDetails;
use crate::config::OrderServiceConfig;

/// The single payment method this storefront supports. There is no gateway
/// selection surface; see DESIGN.md for the payment handling gaps carried
/// from the source design.
pub const PAYMENT_METHOD: &str = "cod";

/// Errors that can occur when submitting an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Transport-level failure. Retryable by the user.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Domain-level rejection from the order service (e.g., price
    /// mismatch). Surfaced verbatim; never retried automatically.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The order service errored or is down. Retryable by the user.
    #[error("order service unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Failed to parse the order service response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A line price could not be converted to minor units.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl OrderError {
    /// Whether a user-initiated retry is worthwhile.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Unavailable { .. })
    }
}

/// Inline contact info for an order placed without an authenticated
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub email: Option<String>,
    pub phone: String,
    pub full_name: String,
}

/// Shipping address wire shape, always populated from delivery details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// One order line on the wire. `unit_price` is in integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<OptionId>,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: i64,
    pub image_url: String,
}

/// Order creation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_info: Option<GuestInfo>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub payment_method: String,
    pub payment_transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_notes: Option<String>,
}

/// Order creation response. Monetary totals are in integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub subtotal: i64,
    pub shipping_charge: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

/// Build the wire-level order request. Pure transformation: no I/O, no
/// mutation of the cart.
///
/// When `customer` is present, identity is resolved server-side and
/// `guest_info` is omitted. The shipping address comes from the delivery
/// details regardless of identity.
///
/// # Errors
///
/// Returns [`OrderError::Money`] if a line price cannot be represented in
/// minor units.
pub fn build_order_request(
    cart: &Cart,
    details: &DeliveryDetails,
    customer: Option<CustomerId>,
) -> Result<OrderRequest, OrderError> {
    let guest_info = match customer {
        Some(_) => None,
        None => Some(GuestInfo {
            email: details.email.clone(),
            phone: details.phone.clone(),
            full_name: details.full_name.clone(),
        }),
    };

    let items = cart
        .lines()
        .iter()
        .map(|line| {
            Ok(OrderItem {
                product_id: line.key.product_id,
                variant_id: line.variant_id,
                option_id: line.option_id,
                product_name: line.product_name.clone(),
                variant_name: line.variant_name.clone(),
                size: line.key.size.as_str().to_string(),
                color: line.key.color.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.minor_units()?,
                image_url: line.image_url.clone(),
            })
        })
        .collect::<Result<Vec<_>, MoneyError>>()?;

    Ok(OrderRequest {
        guest_info,
        shipping_address: ShippingAddress {
            full_name: details.full_name.clone(),
            phone: details.phone.clone(),
            address_line1: details.address_line1.clone(),
            address_line2: details.address_line2.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            postal_code: details.postal_code.clone(),
        },
        items,
        payment_method: PAYMENT_METHOD.to_string(),
        payment_transaction_id: placeholder_transaction_id(),
        order_notes: details.notes.clone(),
    })
}

/// Client-generated placeholder transaction token. Not a payment
/// verification mechanism; a trusted processor should issue and verify the
/// real one server-side.
fn placeholder_transaction_id() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

/// Submits order requests to the order service.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Issue exactly one order creation call. Never retries internally.
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, OrderError>;
}

/// HTTP client for the order service.
#[derive(Clone)]
pub struct OrderServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl OrderServiceClient {
    /// Create a new order service client.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Parse`] if the API key cannot be encoded as a
    /// header value.
    pub fn new(config: &OrderServiceConfig) -> Result<Self, OrderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_header = reqwest::header::HeaderValue::from_str(&auth_value)
            .map_err(|e| OrderError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OrderGateway for OrderServiceClient {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, OrderError> {
        let url = format!("{}/orders", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();

        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(OrderError::Rejected(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OrderError::Unavailable {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OrderError::Parse(e.to_string()))
    }
}
