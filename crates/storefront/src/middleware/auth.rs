//! Customer authentication extractors.
//!
//! The storefront does not authenticate customers itself; the (external)
//! sign-in flow deposits a backend-issued bearer token in the session. These
//! extractors read it back. A request without a token never reaches the
//! backend - operations that need one refuse locally.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{AccessToken, session_keys};

/// Extractor that requires a signed-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireCustomer(token): RequireCustomer,
/// ) -> impl IntoResponse {
///     // Use the token for backend calls
/// }
/// ```
pub struct RequireCustomer(pub AccessToken);

/// Rejection returned when a customer token is required but absent.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Please sign in to continue." })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let token: AccessToken = session
            .get(session_keys::ACCESS_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(token))
    }
}

/// Extractor that optionally gets the customer token.
///
/// Unlike `RequireCustomer`, this does not reject the request when no
/// customer is signed in - cart views and badge counts degrade to the empty
/// state instead of erroring.
pub struct OptionalCustomer(pub Option<AccessToken>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<AccessToken>(session_keys::ACCESS_TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(token))
    }
}

/// Helper to set the customer token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_access_token(
    session: &Session,
    token: &AccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::ACCESS_TOKEN, token).await
}

/// Helper to clear the customer token from the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_access_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AccessToken>(session_keys::ACCESS_TOKEN).await?;
    Ok(())
}
