//! Checkout route handlers.
//!
//! The order submission handler is two-phase around the network call so the
//! context lock is never held across an `.await`:
//!
//! 1. Under the lock: transition to Submitting (rejecting a second concurrent
//!    submit) and build the wire request from the cart and details.
//! 2. Unlocked: issue the single order creation call.
//! 3. Under the lock again: record success (clearing the cart) or failure.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use banyan_core::{CurrencyCode, Price};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::checkout::{CheckoutError, CheckoutSession, CheckoutState, DeliveryDetails};
use crate::error::{AppError, Result};
use crate::routes::cart::CartView;
use crate::routes::{context_id, customer_id};
use crate::services::orders::{OrderResult, build_order_request};
use crate::state::AppState;

/// Checkout display data for the current step.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DeliveryDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderConfirmationView>,
}

/// Confirmed order display data. Monetary fields carry both the raw minor
/// units and a formatted display string.
#[derive(Debug, Serialize)]
pub struct OrderConfirmationView {
    pub order_number: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub estimated_delivery: chrono::DateTime<chrono::Utc>,
    pub subtotal: i64,
    pub subtotal_display: String,
    pub shipping_charge: i64,
    pub shipping_charge_display: String,
    pub discount_amount: i64,
    pub discount_display: String,
    pub total_amount: i64,
    pub total_display: String,
}

impl From<&OrderResult> for OrderConfirmationView {
    fn from(result: &OrderResult) -> Self {
        let display = |minor| Price::from_minor_units(minor, CurrencyCode::INR).display();
        Self {
            order_number: result.order_number.clone(),
            created_at: result.created_at,
            estimated_delivery: result.estimated_delivery,
            subtotal: result.subtotal,
            subtotal_display: display(result.subtotal),
            shipping_charge: result.shipping_charge,
            shipping_charge_display: display(result.shipping_charge),
            discount_amount: result.discount_amount,
            discount_display: display(result.discount_amount),
            total_amount: result.total_amount,
            total_display: display(result.total_amount),
        }
    }
}

fn view_for(checkout: &CheckoutSession, cart: Option<CartView>) -> CheckoutView {
    let (error, order) = match checkout.state() {
        CheckoutState::Failed { message, .. } => (Some(message.clone()), None),
        CheckoutState::Succeeded { result } => (None, Some(OrderConfirmationView::from(result))),
        _ => (None, None),
    };

    CheckoutView {
        step: checkout.state().name(),
        details: checkout.delivery_details().cloned(),
        cart,
        error,
        order,
    }
}

/// Start a checkout, or resume the one already in progress.
///
/// Checkout is only reachable with a non-empty cart.
#[instrument(skip(state, session))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<CheckoutView>)> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);

    if ctx.cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    // An in-progress attempt is resumed rather than restarted; only a
    // consumed or absent session gets a fresh one.
    let resumed = ctx.checkout.is_some();
    ctx.checkout.get_or_insert_with(CheckoutSession::new);

    let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
    let view = view_for(checkout, Some(CartView::from(&ctx.cart)));

    let status = if resumed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(view)))
}

/// Current checkout state.
///
/// A succeeded checkout is consumed by this read: the confirmation is
/// returned once and the session is discarded, so a stale checkout can
/// never be reopened.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);

    let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
    let view = view_for(checkout, Some(CartView::from(&ctx.cart)));

    if matches!(checkout.state(), CheckoutState::Succeeded { .. }) {
        ctx.checkout = None;
    }

    Ok(Json(view))
}

/// Submit delivery details. Valid details advance to the summary step;
/// invalid details return the full field-keyed error map and stay at the
/// address step.
#[instrument(skip(state, session, details))]
pub async fn address(
    State(state): State<AppState>,
    session: Session,
    Json(details): Json<DeliveryDetails>,
) -> Result<Json<CheckoutView>> {
    let id = context_id(&session).await?;
    let guest = customer_id(&session).await?.is_none();

    let mut ctx = state.contexts().entry(id);
    ctx.checkout
        .as_mut()
        .ok_or(CheckoutError::NoSession)?
        .submit_address(details, guest)?;

    let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
    let view = view_for(checkout, Some(CartView::from(&ctx.cart)));
    Ok(Json(view))
}

/// Return from the summary to the address step, preserving entered details.
#[instrument(skip(state, session))]
pub async fn edit_address(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);

    ctx.checkout
        .as_mut()
        .ok_or(CheckoutError::NoSession)?
        .edit_address()?;

    let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
    let view = view_for(checkout, Some(CartView::from(&ctx.cart)));
    Ok(Json(view))
}

/// Place the order.
///
/// At most one submission is outstanding per checkout; a concurrent second
/// request is rejected before any network call. On success the cart is
/// cleared; on failure cart and details are untouched.
#[instrument(skip(state, session))]
pub async fn submit(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let id = context_id(&session).await?;
    let customer = customer_id(&session).await?;

    // Phase 1: transition to Submitting and build the request under the lock.
    let request = {
        let mut ctx = state.contexts().entry(id);
        if ctx.checkout.is_none() {
            return Err(CheckoutError::NoSession.into());
        }
        if ctx.cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let details = ctx
            .checkout
            .as_mut()
            .ok_or(CheckoutError::NoSession)?
            .begin_submission()?;
        match build_order_request(&ctx.cart, &details, customer) {
            Ok(request) => request,
            Err(e) => {
                // Unwind the Submitting transition so the user is not stuck.
                ctx.checkout
                    .as_mut()
                    .ok_or(CheckoutError::NoSession)?
                    .submission_failed(e.to_string())?;
                return Err(e.into());
            }
        }
    };

    // Phase 2: exactly one order creation call, with no lock held.
    let outcome = state.orders().submit_order(&request).await;

    // Phase 3: record the outcome.
    let Some(mut ctx) = state.contexts().get_mut(id) else {
        tracing::warn!(context_id = %id, "shopper context vanished during order submission");
        return Err(AppError::Internal(
            "checkout session no longer exists".to_string(),
        ));
    };
    let checkout = ctx.checkout.as_mut().ok_or(CheckoutError::NoSession)?;

    match outcome {
        Ok(result) => {
            tracing::info!(order_number = %result.order_number, "order confirmed");
            checkout.submission_succeeded(result)?;
            // Only a confirmed order empties the cart.
            ctx.cart.clear();
            let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
            Ok(Json(view_for(checkout, None)))
        }
        Err(e) => {
            checkout.submission_failed(e.to_string())?;
            Err(e.into())
        }
    }
}

/// Retry after a failed submission. Returns to the summary step; the next
/// submit rebuilds the request fresh from the then-current cart.
#[instrument(skip(state, session))]
pub async fn retry(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);

    ctx.checkout
        .as_mut()
        .ok_or(CheckoutError::NoSession)?
        .retry()?;

    let checkout = ctx.checkout.as_ref().ok_or(CheckoutError::NoSession)?;
    let view = view_for(checkout, Some(CartView::from(&ctx.cart)));
    Ok(Json(view))
}

/// Abandon the checkout. The cart is untouched.
#[instrument(skip(state, session))]
pub async fn abandon(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let id = context_id(&session).await?;
    let mut ctx = state.contexts().entry(id);
    ctx.checkout = None;
    Ok(StatusCode::NO_CONTENT)
}
