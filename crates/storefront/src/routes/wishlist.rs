//! Wishlist route handlers.
//!
//! The wishlist is deliberately simpler than the cart: no quantities, no
//! stock checks, deduplicated per product.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use banyan_core::ProductId;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::context_id;
use crate::state::AppState;
use crate::wishlist::{Wishlist, WishlistItem};

/// Wishlist display data.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItemView>,
}

/// Wishlist entry display data.
#[derive(Debug, Serialize)]
pub struct WishlistItemView {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: String,
    pub image_url: String,
}

impl From<&Wishlist> for WishlistView {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            items: wishlist
                .items()
                .iter()
                .map(|item| WishlistItemView {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    unit_price: item.unit_price.display(),
                    image_url: item.image_url.clone(),
                })
                .collect(),
        }
    }
}

/// Display wishlist contents.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<WishlistView>> {
    let id = context_id(&session).await?;
    let ctx = state.contexts().entry(id);
    Ok(Json(WishlistView::from(&ctx.wishlist)))
}

/// Save an item to the wishlist. Saving an already-saved product is a
/// no-op.
#[instrument(skip(state, session, item))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(item): Json<WishlistItem>,
) -> Result<(StatusCode, Json<WishlistView>)> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    ctx.wishlist.add_item(item);
    Ok((StatusCode::CREATED, Json(WishlistView::from(&ctx.wishlist))))
}

/// Remove an item from the wishlist.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistView>> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    if !ctx.wishlist.remove_item(product_id) {
        return Err(AppError::NotFound(format!(
            "product {product_id} is not in the wishlist"
        )));
    }
    Ok(Json(WishlistView::from(&ctx.wishlist)))
}

/// Empty the wishlist.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    ctx.wishlist.clear();
    Ok(StatusCode::NO_CONTENT)
}
