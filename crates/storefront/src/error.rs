//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding. All route handlers return `Result<T, AppError>`; the
//! conversion here is where internal errors become short, user-presentable
//! messages - raw payloads never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Backend call failed outside a cart/checkout operation.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to the presentation layer.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    fn backend_status(err: &BackendError) -> StatusCode {
        match err {
            BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
            BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                CartError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                CartError::Backend(e) => Self::backend_status(e),
                CartError::Inconsistent { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                // Client-side gate: the order was refused before any
                // backend call.
                CheckoutError::NotSubmittable(_) => StatusCode::CONFLICT,
                CheckoutError::DestinationMismatch => StatusCode::BAD_REQUEST,
                CheckoutError::Cart(e) => match e {
                    CartError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                    CartError::Backend(b) => Self::backend_status(b),
                    _ => StatusCode::BAD_GATEWAY,
                },
                CheckoutError::Backend(e) => Self::backend_status(e),
            },
            Self::Backend(err) => Self::backend_status(err),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Cart(err) => err.user_message().to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::AuthenticationRequired => {
                    "Please sign in to check out.".to_string()
                }
                CheckoutError::NotSubmittable(block) => block.user_message().to_string(),
                CheckoutError::DestinationMismatch => {
                    "Your address country doesn't match the selected destination.".to_string()
                }
                CheckoutError::Cart(e) => e.user_message().to_string(),
                CheckoutError::Backend(_) => {
                    "We couldn't place your order. Please try again.".to_string()
                }
            },
            Self::Backend(BackendError::Unauthorized) => "Please sign in.".to_string(),
            Self::Backend(_) => "Something went wrong. Please try again.".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Whether this error is a server fault worth a Sentry event.
    fn is_server_fault(&self) -> bool {
        match self {
            Self::Internal(_) | Self::Session(_) => true,
            Self::Cart(CartError::Inconsistent { .. }) => true,
            Self::Cart(CartError::Backend(e))
            | Self::Checkout(CheckoutError::Backend(e))
            | Self::Backend(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ErrorBody {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an opaque customer key.
///
/// Call this after a session is established to associate errors with a
/// customer without exposing the token itself.
pub fn set_sentry_user(customer_key: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_key.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
