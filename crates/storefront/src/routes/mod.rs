//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Session
//! POST   /auth/session         - Bind a backend-issued token to the session
//! DELETE /auth/session         - Sign out
//!
//! # Cart
//! GET  /cart                   - Cart contents
//! POST /cart/add               - Add item
//! POST /cart/update            - Change quantity
//! POST /cart/remove            - Remove item
//! GET  /cart/count             - Cart count badge (0 without a session)
//!
//! # Checkout
//! GET  /checkout               - Checkout view (subtotal, quote, total, eligibility)
//! POST /checkout/destination   - Set destination country/currency, re-estimate
//! POST /checkout/refresh       - Re-trigger estimation
//! POST /checkout/order         - Submit order (gated on quote state)
//!
//! # Account (requires auth)
//! GET  /account/profile        - Customer profile
//! PUT  /account/address        - Replace default shipping address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the session routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route(
        "/session",
        post(auth::create_session).delete(auth::destroy_session),
    )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/destination", post(checkout::destination))
        .route("/refresh", post(checkout::refresh))
        .route("/order", post(checkout::submit))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(account::profile))
        .route("/address", put(account::update_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Session routes
        .nest("/auth", auth_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Account routes
        .nest("/account", account_routes())
}
