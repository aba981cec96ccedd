//! Backend order-service client.
//!
//! # Architecture
//!
//! - REST + JSON over `reqwest`; one method per endpoint
//! - The backend is source of truth for carts, orders, and shipping quotes -
//!   the storefront never computes these locally
//! - Mutating cart calls return no body worth trusting; callers refetch
//!
//! # Example
//!
//! ```rust,ignore
//! use opaline_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! // Fetch the caller's cart
//! let cart = client.get_cart(&token).await?;
//!
//! // Quote shipping for its contents
//! let quote = client.estimate_shipping(&request).await?;
//! ```

mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the backend order service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The bearer token was missing or rejected by the backend.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend reported the destination as non-serviceable.
    ///
    /// Only the shipping-estimate endpoint produces this; it is a
    /// first-class outcome, not a generic failure.
    #[error("destination not serviceable")]
    DestinationUnavailable,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
}

impl BackendError {
    /// Whether retrying the same operation may succeed.
    ///
    /// `DestinationUnavailable` and `Unauthorized` are definitive answers
    /// for the current inputs; everything else is transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::DestinationUnavailable | Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("cart".to_string());
        assert_eq!(err.to_string(), "not found: cart");

        let err = BackendError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = BackendError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status 503: maintenance");
    }

    #[test]
    fn test_transient_classification() {
        assert!(!BackendError::DestinationUnavailable.is_transient());
        assert!(!BackendError::Unauthorized.is_transient());
        assert!(
            BackendError::Status {
                status: 500,
                body: String::new(),
            }
            .is_transient()
        );
        assert!(BackendError::RateLimited(1).is_transient());
    }
}
