//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding with a JSON body. All route handlers should
//! return `Result<T, AppError>`.
//!
//! Every error here is local to cart or checkout and recoverable by user
//! action or navigation - nothing is fatal to the surrounding application.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::services::catalog::CatalogError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout transition or validation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Catalog/stock read failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order submission failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::NoSizeSelected(_) | CartError::ZeroQuantity => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CartError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CartError::StockUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CartError::LineNotFound(_) => StatusCode::NOT_FOUND,
            },
            Self::Checkout(err) => match err {
                CheckoutError::InvalidDetails(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::EmptyCart
                | CheckoutError::SubmissionInFlight
                | CheckoutError::InvalidTransition { .. } => StatusCode::CONFLICT,
                CheckoutError::NoSession => StatusCode::NOT_FOUND,
            },
            // A failed stock read blocks the action; it is never treated as
            // infinite availability.
            Self::Catalog(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Order(err) => match err {
                OrderError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                OrderError::Http(_) | OrderError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
                OrderError::Parse(_) | OrderError::Money(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the user can meaningfully retry the action unchanged.
    const fn retryable(&self) -> bool {
        match self {
            Self::Catalog(_) | Self::Cart(CartError::StockUnavailable(_)) => true,
            Self::Order(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Domain rejections from the order service are surfaced verbatim.
            Self::Order(OrderError::Rejected(message)) => message.clone(),
            Self::Order(err) if err.is_retryable() => {
                "Could not reach the order service; please try again".to_string()
            }
            Self::Catalog(_) => {
                "Stock information is currently unavailable; please try again".to_string()
            }
            // Don't expose internal error details to clients
            Self::Session(_) | Self::Internal(_) | Self::Order(_) => {
                "Internal server error".to_string()
            }
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Internal(_) | Self::Session(_) | Self::Catalog(_) | Self::Order(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let mut body = serde_json::json!({
            "error": self.client_message(),
            "retryable": self.retryable(),
        });

        // Per-field validation errors are returned alongside the message so
        // the form can show every problem at once.
        if let Self::Checkout(CheckoutError::InvalidDetails(fields)) = &self {
            body["fields"] = serde_json::json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
