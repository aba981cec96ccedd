//! Session-related types.
//!
//! Types stored in the session for authentication and account state. The
//! storefront never mints credentials itself; the token below is issued by
//! the backend during the (external) sign-in flow and handed to
//! `POST /auth/session`.

use core::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Backend-issued bearer token identifying the signed-in customer.
///
/// Attached to every authenticated backend call. Implements `Debug`
/// manually so the token never lands in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
}

impl AccessToken {
    /// Wrap a backend-issued token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw token for the `Authorization: Bearer` header.
    #[must_use]
    pub fn bearer(&self) -> &str {
        &self.token
    }

    /// A stable, non-reversible key for process-local caches.
    ///
    /// Keeps the raw token out of cache key space while staying stable for
    /// the lifetime of the token.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for authentication and account data.
pub mod keys {
    /// Key for storing the backend-issued bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for the cached customer profile.
    pub const CUSTOMER_PROFILE: &str = "customer_profile";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("tok_super_secret_value");
        let debug_output = format!("{token:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_super_secret_value"));
    }

    #[test]
    fn test_cache_key_is_stable_and_opaque() {
        let token = AccessToken::new("tok_abc");
        assert_eq!(token.cache_key(), token.cache_key());
        assert!(!token.cache_key().contains("tok_abc"));

        let other = AccessToken::new("tok_def");
        assert_ne!(token.cache_key(), other.cache_key());
    }
}
