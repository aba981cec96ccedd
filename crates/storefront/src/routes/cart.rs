//! Cart route handlers.
//!
//! All handlers speak JSON; the presentation layer renders from these
//! views. Reads degrade to the empty cart without a session; mutations
//! refuse locally with 401 before any backend call is made.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use opaline_core::{Money, ProductId};

use crate::backend::{Cart, CartItem};
use crate::error::Result;
use crate::middleware::OptionalCustomer;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
    pub line_total: Money,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Money,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView::from_item(item, cart))
                .collect(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
        }
    }
}

impl CartItemView {
    fn from_item(item: &CartItem, cart: &Cart) -> Self {
        let line_total = item.price * Decimal::from(item.quantity);
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            price: Money::new(item.price, cart.currency),
            line_total: Money::new(line_total, cart.currency),
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Clone, Serialize)]
pub struct CartCountView {
    pub count: u32,
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Current cart contents.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Json<CartView> {
    let cart = state.carts().current(customer.as_ref()).await;
    Json(CartView::from(&cart))
}

/// Add an item to the cart.
#[instrument(skip(state, customer))]
pub async fn add(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let cart = state
        .carts()
        .add_item(
            customer.as_ref(),
            &request.product_id,
            request.quantity.unwrap_or(1),
        )
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Change an item's quantity.
#[instrument(skip(state, customer))]
pub async fn update(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let cart = state
        .carts()
        .update_quantity(customer.as_ref(), &request.product_id, request.quantity)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove an item from the cart.
#[instrument(skip(state, customer))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let cart = state
        .carts()
        .remove_item(customer.as_ref(), &request.product_id)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Cart count badge.
///
/// Always 200; a missing session is a count of zero, not an error.
#[instrument(skip(state, customer))]
pub async fn count(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Json<CartCountView> {
    let count = state.carts().item_count(customer.as_ref()).await;
    Json(CartCountView { count })
}
