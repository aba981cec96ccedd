//! Checkout route handlers.
//!
//! Thin wrappers over the checkout orchestrator. Every handler requires a
//! signed-in customer; the orchestrator owns all gating decisions.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use opaline_core::{CountryCode, CurrencyCode};

use crate::backend::ShippingAddress;
use crate::checkout::{CheckoutError, CheckoutView, OrderPlacedView};
use crate::error::Result;
use crate::middleware::OptionalCustomer;
use crate::state::AppState;

/// Destination change request.
#[derive(Debug, Deserialize)]
pub struct DestinationRequest {
    pub country: CountryCode,
    /// Defaults to the store's base currency when omitted.
    pub currency: Option<CurrencyCode>,
}

/// Order submission request.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
}

/// Enter checkout: sync the cart snapshot, estimate if needed, return the
/// current view.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Result<Json<CheckoutView>> {
    let token = customer.ok_or(CheckoutError::AuthenticationRequired)?;
    let view = state.checkout().checkout_view(&token).await?;
    Ok(Json(view))
}

/// Change destination country (and optionally currency), superseding any
/// in-flight estimation.
#[instrument(skip(state, customer, request))]
pub async fn destination(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<DestinationRequest>,
) -> Result<Json<CheckoutView>> {
    let token = customer.ok_or(CheckoutError::AuthenticationRequired)?;
    let currency = request
        .currency
        .unwrap_or(state.config().base_currency);
    let view = state
        .checkout()
        .set_destination(&token, request.country, currency)
        .await?;
    Ok(Json(view))
}

/// Re-trigger estimation for the current inputs (the retry path for the
/// `error` quote state).
#[instrument(skip(state, customer))]
pub async fn refresh(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Result<Json<CheckoutView>> {
    let token = customer.ok_or(CheckoutError::AuthenticationRequired)?;
    let view = state.checkout().refresh(&token).await?;
    Ok(Json(view))
}

/// Submit the order.
///
/// Rejected client-side (409) while the quote is anything but `ready`; the
/// backend is only called once the gate passes.
#[instrument(skip(state, customer, request))]
pub async fn submit(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<Json<OrderPlacedView>> {
    let token = customer.ok_or(CheckoutError::AuthenticationRequired)?;
    let placed = state
        .checkout()
        .submit(&token, request.shipping_address, request.payment_method)
        .await?;
    Ok(Json(placed))
}
