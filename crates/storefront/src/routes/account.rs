//! Account route handlers.
//!
//! Only the pieces checkout depends on: the customer profile and its
//! default shipping address. Address changes refresh the session's profile
//! copy in place - no reload-the-page synchronization.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{Profile, ShippingAddress};
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::state::AppState;

/// The customer's profile, from the session cache when warm.
#[instrument(skip(state, session, token))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
) -> Result<Json<Profile>> {
    if let Some(profile) = state.profiles().cached(&session).await {
        return Ok(Json(profile));
    }

    let profile = state.profiles().refresh(&session, &token).await?;
    Ok(Json(profile))
}

/// Replace the default shipping address (full replace, then refresh).
#[instrument(skip(state, session, token, address))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<Profile>> {
    let profile = state
        .profiles()
        .update_address(&session, &token, address)
        .await?;
    Ok(Json(profile))
}
