//! Cart route handlers.
//!
//! Each mutating handler reads authoritative stock from the catalog *before*
//! touching the cart, then mutates under the context lock. The stock read
//! happens outside the lock - registry guards are never held across an
//! `.await`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use banyan_core::{CurrencyCode, Price, ProductId, Size, VariantKey};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{Cart, CartError, SelectedVariant};
use crate::error::{AppError, Result};
use crate::routes::context_id;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: Uuid,
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub size: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: String,
}

/// Cart display data. Totals are derived from the lines at render time.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let currency = cart
            .lines()
            .first()
            .map_or(CurrencyCode::default(), |line| line.unit_price.currency_code);

        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    id: line.id,
                    product_id: line.key.product_id,
                    product_name: line.product_name.clone(),
                    variant_name: line.variant_name.clone(),
                    size: line.key.size.as_str().to_string(),
                    color: line.key.color.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price.display(),
                    line_total: Price::new(line.line_total(), line.unit_price.currency_code)
                        .display(),
                    image_url: line.image_url.clone(),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: Price::new(cart.subtotal(), currency).display(),
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(flatten)]
    pub variant: SelectedVariant,
    pub quantity: Option<u32>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Stock query parameters.
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub product_id: ProductId,
    pub size: Size,
    pub color: Option<String>,
}

/// Remaining-stock response body.
#[derive(Debug, Serialize)]
pub struct StockView {
    pub remaining: u32,
}

/// Display cart contents.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let id = context_id(&session).await?;
    let ctx = state.contexts().entry(id);
    Ok(Json(CartView::from(&ctx.cart)))
}

/// Add an item to the cart, merging into an existing line for the same
/// variant.
#[instrument(skip(state, session, request))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let id = context_id(&session).await?;
    let quantity = request.quantity.unwrap_or(1);

    // Validation failures short-circuit before any network read.
    let size = request
        .variant
        .size
        .as_ref()
        .ok_or(CartError::NoSizeSelected(request.variant.product_id))?
        .clone();
    if quantity == 0 {
        return Err(CartError::ZeroQuantity.into());
    }

    let available = state
        .catalog()
        .remaining_stock(
            request.variant.product_id,
            &size,
            request.variant.color.as_deref(),
        )
        .await
        .map_err(|e| CartError::StockUnavailable(e.to_string()))?;

    let mut ctx = state.contexts().entry(id);
    ctx.cart.add_item(request.variant, quantity, available)?;

    Ok((StatusCode::CREATED, Json(CartView::from(&ctx.cart))))
}

/// Set a line's quantity. Zero removes the line without a stock read.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let id = context_id(&session).await?;

    if request.quantity == 0 {
        let mut ctx = state.contexts().entry(id);
        ctx.cart.update_quantity(line_id, 0, 0)?;
        return Ok(Json(CartView::from(&ctx.cart)));
    }

    // Copy the variant key out, drop the guard, read stock, re-enter.
    let key = {
        let ctx = state.contexts().entry(id);
        ctx.cart
            .line(line_id)
            .map(|line| line.key.clone())
            .ok_or(CartError::LineNotFound(line_id))?
    };

    let available = state
        .catalog()
        .remaining_stock(key.product_id, &key.size, key.color.as_deref())
        .await
        .map_err(|e| CartError::StockUnavailable(e.to_string()))?;

    let mut ctx = state.contexts().entry(id);
    ctx.cart.update_quantity(line_id, request.quantity, available)?;

    Ok(Json(CartView::from(&ctx.cart)))
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<Uuid>,
) -> Result<Json<CartView>> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    ctx.cart.remove_item(line_id)?;
    Ok(Json(CartView::from(&ctx.cart)))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    ctx.cart.clear();
    Ok(StatusCode::NO_CONTENT)
}

/// Remaining addable stock for a variant, net of what the cart already
/// holds.
#[instrument(skip(state, session))]
pub async fn stock(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StockQuery>,
) -> Result<Json<StockView>> {
    let id = context_id(&session).await?;

    let available = state
        .catalog()
        .remaining_stock(query.product_id, &query.size, query.color.as_deref())
        .await
        .map_err(AppError::Catalog)?;

    let key = VariantKey::new(query.product_id, query.size, query.color);
    let ctx = state.contexts().entry(id);
    let remaining = ctx.cart.remaining_stock(&key, available);

    Ok(Json(StockView { remaining }))
}
