//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Health check
//!
//! # Cart
//! GET    /cart                       - Cart contents
//! POST   /cart/items                 - Add item (or increment existing line)
//! PATCH  /cart/items/{line_id}       - Set line quantity (0 removes)
//! DELETE /cart/items/{line_id}       - Remove line
//! DELETE /cart                       - Clear cart
//! GET    /cart/stock                 - Remaining stock for a variant
//!
//! # Wishlist
//! GET    /wishlist                   - Wishlist contents
//! POST   /wishlist/items             - Save an item
//! DELETE /wishlist/items/{id}        - Remove an item
//! DELETE /wishlist                   - Clear wishlist
//!
//! # Checkout
//! POST   /checkout                   - Start (or resume) a checkout
//! GET    /checkout                   - Current checkout state
//! PUT    /checkout/address           - Submit delivery details
//! POST   /checkout/address/edit      - Return from summary to address entry
//! POST   /checkout/submit            - Place the order
//! POST   /checkout/retry             - Retry after a failed submission
//! DELETE /checkout                   - Abandon the checkout
//! ```

pub mod cart;
pub mod checkout;
pub mod wishlist;

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use banyan_core::CustomerId;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::session_keys;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{line_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
        .route("/stock", get(cart::stock))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).delete(wishlist::clear))
        .route("/items", post(wishlist::add))
        .route("/items/{product_id}", delete(wishlist::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(checkout::start)
                .get(checkout::show)
                .delete(checkout::abandon),
        )
        .route("/address", put(checkout::address))
        .route("/address/edit", post(checkout::edit_address))
        .route("/submit", post(checkout::submit))
        .route("/retry", post(checkout::retry))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
}

/// Build the complete application router with session layer and state.
///
/// Shared by `main` and the integration tests so both exercise the same
/// middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = crate::middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(session_layer)
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the shopper's context id from the session, creating one on first use.
pub(crate) async fn context_id(session: &Session) -> Result<Uuid, AppError> {
    if let Some(id) = session.get::<Uuid>(session_keys::CONTEXT_ID).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    session.insert(session_keys::CONTEXT_ID, id).await?;
    Ok(id)
}

/// Get the signed-in customer id, if any.
pub(crate) async fn customer_id(session: &Session) -> Result<Option<CustomerId>, AppError> {
    Ok(session.get::<CustomerId>(session_keys::CUSTOMER_ID).await?)
}
