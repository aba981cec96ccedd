//! HTTP client for the backend order service.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::instrument;

use opaline_core::{CountryCode, ProductId};

use crate::config::BackendConfig;
use crate::models::AccessToken;

use super::BackendError;
use super::types::{
    Cart, EstimateRequest, EstimateResponse, GeoDetectResponse, OrderConfirmation, OrderRequest,
    Profile, ProfileUpdate,
};

/// Client for the backend order service.
///
/// Cheaply cloneable; all methods issue a single HTTP request and convert
/// non-success statuses into [`BackendError`]. Responses for mutable state
/// (carts, orders) are never cached here.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request, mapping transport failures.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        Ok(request.send().await?)
    }

    /// Convert a non-success status into the matching error.
    ///
    /// Reads the body as text first so unexpected statuses carry useful
    /// diagnostics in logs.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await.unwrap_or_default();
        let truncated: String = body.chars().take(200).collect();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(truncated));
        }

        tracing::error!(
            status = %status,
            body = %truncated,
            "backend returned non-success status"
        );
        Err(BackendError::Status {
            status: status.as_u16(),
            body: truncated,
        })
    }

    /// Read and parse a success response body.
    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &AccessToken) -> Result<Cart, BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .get(self.endpoint("/cart"))
                    .bearer_auth(token.bearer()),
            )
            .await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Add a quantity of a product to the caller's cart.
    ///
    /// The response body is intentionally discarded; callers refetch the
    /// cart so the mirror stays server-authoritative.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let quantity = quantity.to_string();
        let response = self
            .send(
                self.inner
                    .client
                    .post(self.endpoint("/cart/add"))
                    .query(&[
                        ("product_id", product_id.as_str()),
                        ("quantity", quantity.as_str()),
                    ])
                    .bearer_auth(token.bearer()),
            )
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Remove a product from the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .delete(self.endpoint(&format!("/cart/remove/{product_id}")))
                    .bearer_auth(token.bearer()),
            )
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    // =========================================================================
    // Shipping Methods
    // =========================================================================

    /// Request a shipping quote for an explicit item list.
    ///
    /// A `400` from this endpoint is the backend's defined signal that the
    /// destination is not serviceable; it maps to
    /// [`BackendError::DestinationUnavailable`] rather than a generic status
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `DestinationUnavailable` for non-serviceable destinations and
    /// transport/status errors otherwise.
    #[instrument(skip(self, request), fields(country = %request.country_code, currency = %request.currency))]
    pub async fn estimate_shipping(
        &self,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .post(self.endpoint("/shipping/estimate"))
                    .json(request),
            )
            .await?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(BackendError::DestinationUnavailable);
        }

        Self::parse_json(Self::check_status(response).await?).await
    }

    // =========================================================================
    // Geolocation Methods
    // =========================================================================

    /// Best-effort country detection by caller IP.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or status failure; callers treat any
    /// failure as "unknown" and fall back to the configured default.
    #[instrument(skip(self))]
    pub async fn detect_country(&self) -> Result<Option<CountryCode>, BackendError> {
        let response = self
            .send(self.inner.client.get(self.endpoint("/geo/detect")))
            .await?;
        let detected: GeoDetectResponse =
            Self::parse_json(Self::check_status(response).await?).await?;

        // An unparseable code from the geo service is advisory data gone bad,
        // not a failure worth surfacing.
        Ok(detected.country_code.and_then(|code| {
            code.parse::<CountryCode>()
                .map_err(|e| tracing::warn!(code = %code, error = %e, "geo detection returned invalid country code"))
                .ok()
        }))
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit an order against the caller's current server-side cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the token is rejected, or the
    /// backend refuses the order.
    #[instrument(skip(self, token, order))]
    pub async fn submit_order(
        &self,
        token: &AccessToken,
        order: &OrderRequest,
    ) -> Result<OrderConfirmation, BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .post(self.endpoint("/orders"))
                    .bearer_auth(token.bearer())
                    .json(order),
            )
            .await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    // =========================================================================
    // Profile Methods
    // =========================================================================

    /// Fetch the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_profile(&self, token: &AccessToken) -> Result<Profile, BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .get(self.endpoint("/profile"))
                    .bearer_auth(token.bearer()),
            )
            .await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Replace the caller's default shipping address.
    ///
    /// The update is a full replace of the address sub-object; callers
    /// refetch the profile afterwards rather than trusting a merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &AccessToken,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .put(self.endpoint("/profile"))
                    .bearer_auth(token.bearer())
                    .json(update),
            )
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
