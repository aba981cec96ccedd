//! Session establishment routes.
//!
//! Customer authentication itself happens against the backend (an external
//! collaborator); once it has issued a bearer token, the sign-in flow hands
//! the token to `POST /auth/session` to bind it to this browser session.
//! Everything here is session bookkeeping - no credentials are verified in
//! this process.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{self, Result};
use crate::middleware::{self, OptionalCustomer};
use crate::models::AccessToken;
use crate::state::AppState;

/// Session establishment request.
#[derive(Deserialize)]
pub struct SessionRequest {
    /// Backend-issued bearer token.
    pub token: String,
}

impl std::fmt::Debug for SessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Bind a backend-issued token to this session.
#[instrument(skip(state, session, request))]
pub async fn create_session(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SessionRequest>,
) -> Result<StatusCode> {
    let token = AccessToken::new(request.token);
    middleware::set_access_token(&session, &token).await?;
    error::set_sentry_user(&token.cache_key());

    // Warm the profile cache; failure here is not a sign-in failure.
    if let Err(e) = state.profiles().refresh(&session, &token).await {
        tracing::debug!(error = %e, "profile warm-up failed after sign-in");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Sign out: drop the token and every process-local trace of the customer.
#[instrument(skip(state, session, customer))]
pub async fn destroy_session(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
) -> Result<StatusCode> {
    if let Some(token) = customer {
        state.carts().invalidate(&token).await;
        state.checkout().invalidate(&token).await;
    }

    middleware::clear_access_token(&session).await?;
    state.profiles().clear(&session).await;
    error::clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}
