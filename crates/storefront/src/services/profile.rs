//! Customer profile service.
//!
//! The session keeps a copy of the backend profile so views can show the
//! customer's name and default address without a round-trip. After any
//! change the copy is refreshed in place - the storefront never relies on a
//! page reload to resynchronize account state.

use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendClient, BackendError, Profile, ProfileUpdate, ShippingAddress};
use crate::models::{AccessToken, session_keys};

/// Fetches and refreshes the session-cached customer profile.
#[derive(Clone)]
pub struct ProfileService {
    backend: BackendClient,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// The session's cached profile, if one has been loaded.
    pub async fn cached(&self, session: &Session) -> Option<Profile> {
        session
            .get::<Profile>(session_keys::CUSTOMER_PROFILE)
            .await
            .ok()
            .flatten()
    }

    /// Fetch the profile from the backend and store it in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the session keeps its
    /// previous copy in that case.
    #[instrument(skip(self, session, token))]
    pub async fn refresh(
        &self,
        session: &Session,
        token: &AccessToken,
    ) -> Result<Profile, BackendError> {
        let profile = self.backend.get_profile(token).await?;
        if let Err(e) = session
            .insert(session_keys::CUSTOMER_PROFILE, &profile)
            .await
        {
            tracing::error!(error = %e, "failed to cache profile in session");
        }
        Ok(profile)
    }

    /// Replace the default shipping address, then refresh the cached
    /// profile.
    ///
    /// The update sends the complete address (full replace of the address
    /// sub-object); the refresh afterwards means a backend that merges
    /// instead still converges to the same session state.
    ///
    /// # Errors
    ///
    /// Returns an error if either the update or the refresh fails.
    #[instrument(skip(self, session, token, address))]
    pub async fn update_address(
        &self,
        session: &Session,
        token: &AccessToken,
        address: ShippingAddress,
    ) -> Result<Profile, BackendError> {
        self.backend
            .update_profile(token, &ProfileUpdate { address })
            .await?;
        self.refresh(session, token).await
    }

    /// Drop the cached profile (sign-out).
    pub async fn clear(&self, session: &Session) {
        if let Err(e) = session
            .remove::<Profile>(session_keys::CUSTOMER_PROFILE)
            .await
        {
            tracing::debug!(error = %e, "failed to clear cached profile");
        }
    }
}
