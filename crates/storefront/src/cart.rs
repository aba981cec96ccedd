//! The cart store - per-session authoritative mirror of the server-side cart.
//!
//! The backend owns cart state; this store is a read-through mirror keyed by
//! customer. Every mutating operation ends with a full refetch rather than an
//! optimistic local merge - the extra round-trip buys totals that can never
//! drift from what the server computed (discounts, stock limits).
//!
//! Callers are expected to await one mutation before issuing the next; the
//! store does not queue concurrent mutations for a customer.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;

use opaline_core::{CurrencyCode, ProductId};

use crate::backend::{BackendClient, BackendError, Cart};
use crate::models::AccessToken;

/// Mirror entries expire on their own after a short idle window; the
/// explicit invalidate-and-refetch on mutation is the primary mechanism.
const MIRROR_TTL: Duration = Duration::from_secs(300);
const MIRROR_CAPACITY: u64 = 10_000;

/// Errors produced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No signed-in customer; the backend call was never made.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The requested quantity is not allowed.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A multi-step mutation partially succeeded; the mirror has been
    /// refetched so local state matches whatever the server now holds.
    #[error("cart update incomplete: {reason}")]
    Inconsistent {
        /// What the failed step was doing.
        reason: String,
    },
}

impl CartError {
    /// Short, user-presentable message for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "Please sign in to manage your bag.",
            Self::InvalidQuantity(_) => "That quantity is not available.",
            Self::Backend(_) => "We couldn't update your bag. Please try again.",
            Self::Inconsistent { .. } => {
                "Your bag could not be fully updated and has been refreshed."
            }
        }
    }
}

/// Single source of truth for cart data within the storefront process.
///
/// Cheaply cloneable; all consumers share one mirror cache.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    backend: BackendClient,
    mirrors: Cache<String, Cart>,
    base_currency: CurrencyCode,
}

impl CartStore {
    /// Create a new cart store over the given backend client.
    #[must_use]
    pub fn new(backend: BackendClient, base_currency: CurrencyCode) -> Self {
        let mirrors = Cache::builder()
            .max_capacity(MIRROR_CAPACITY)
            .time_to_live(MIRROR_TTL)
            .build();

        Self {
            inner: Arc::new(CartStoreInner {
                backend,
                mirrors,
                base_currency,
            }),
        }
    }

    fn empty_cart(&self) -> Cart {
        Cart::empty(self.inner.base_currency)
    }

    /// Load the full cart from the backend and update the mirror.
    ///
    /// On failure the mirror is reset to an empty cart so no stale state
    /// survives, and the failure is reported to the caller rather than
    /// swallowed.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the mirror is already reset when it does.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &AccessToken) -> Result<Cart, CartError> {
        let key = token.cache_key();
        match self.inner.backend.get_cart(token).await {
            Ok(cart) => {
                self.inner.mirrors.insert(key, cart.clone()).await;
                Ok(cart)
            }
            Err(e) => {
                self.inner.mirrors.insert(key, self.empty_cart()).await;
                Err(e.into())
            }
        }
    }

    /// Current cart contents for display.
    ///
    /// Serves from the mirror when warm, refetching otherwise. Absence of a
    /// session or a fetch failure yields an empty cart - views never see an
    /// error from this path.
    pub async fn current(&self, token: Option<&AccessToken>) -> Cart {
        let Some(token) = token else {
            return self.empty_cart();
        };

        if let Some(cart) = self.inner.mirrors.get(&token.cache_key()).await {
            return cart;
        }

        match self.fetch_cart(token).await {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch cart; showing empty");
                self.empty_cart()
            }
        }
    }

    /// Add `quantity` units of a product to the cart.
    ///
    /// Requires a signed-in customer and `quantity >= 1`; neither condition
    /// reaches the backend when violated. Ends with an authoritative refetch.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a token, `InvalidQuantity` for zero,
    /// otherwise the backend failure.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        token: Option<&AccessToken>,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let token = token.ok_or(CartError::AuthenticationRequired)?;
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        self.inner
            .backend
            .add_to_cart(token, product_id, quantity)
            .await?;
        self.fetch_cart(token).await
    }

    /// Set a product's quantity via a remove-then-add sequence.
    ///
    /// There is no atomic update endpoint. A `new_quantity < 1` is a no-op
    /// by contract - decreasing to zero goes through [`Self::remove_item`].
    /// The two steps are compensated, not transactional: whichever step
    /// fails, the cart is refetched afterwards so the mirror never claims a
    /// state the server does not hold.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a token; the remove step's failure
    /// as `Backend`; the re-add step's failure as `Inconsistent` (the item
    /// is gone server-side at that point).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        token: Option<&AccessToken>,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<Cart, CartError> {
        let token = token.ok_or(CartError::AuthenticationRequired)?;
        if new_quantity < 1 {
            return Ok(self.current(Some(token)).await);
        }

        // Removing an item the server no longer has is fine here; the add
        // step recreates it, which is exactly the contract's final state.
        let removed = match self.inner.backend.remove_from_cart(token, product_id).await {
            Ok(()) | Err(BackendError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        };

        let readded = match removed {
            Ok(()) => Some(
                self.inner
                    .backend
                    .add_to_cart(token, product_id, new_quantity)
                    .await,
            ),
            Err(_) => None,
        };

        // Refetch regardless of which step failed.
        let refetched = self.fetch_cart(token).await;

        match (removed, readded) {
            (Err(e), _) => Err(e.into()),
            (Ok(()), Some(Err(e))) => {
                tracing::error!(
                    error = %e,
                    product_id = %product_id,
                    "re-add failed after remove during quantity update"
                );
                Err(CartError::Inconsistent {
                    reason: format!("item {product_id} was removed but could not be re-added"),
                })
            }
            _ => refetched,
        }
    }

    /// Remove a product from the cart.
    ///
    /// Removing a product the cart does not contain is a no-op; the cart
    /// stays fetchable either way.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a token, otherwise the backend
    /// failure.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_item(
        &self,
        token: Option<&AccessToken>,
        product_id: &ProductId,
    ) -> Result<Cart, CartError> {
        let token = token.ok_or(CartError::AuthenticationRequired)?;

        match self.inner.backend.remove_from_cart(token, product_id).await {
            Ok(()) => {}
            Err(BackendError::NotFound(_)) => {
                tracing::debug!(product_id = %product_id, "remove of absent product ignored");
            }
            Err(e) => return Err(e.into()),
        }

        self.fetch_cart(token).await
    }

    /// Number of units in the cart, for badge displays.
    ///
    /// Tolerates the absence of a session by returning 0; never errors.
    pub async fn item_count(&self, token: Option<&AccessToken>) -> u32 {
        self.current(token).await.item_count()
    }

    /// Drop the mirror for a customer (sign-out, order placed).
    pub async fn invalidate(&self, token: &AccessToken) {
        self.inner.mirrors.invalidate(&token.cache_key()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_short_and_plain() {
        let errors = [
            CartError::AuthenticationRequired,
            CartError::InvalidQuantity(0),
            CartError::Backend(BackendError::Unauthorized),
            CartError::Inconsistent {
                reason: "x".to_string(),
            },
        ];

        for err in errors {
            let msg = err.user_message();
            assert!(!msg.is_empty());
            // No raw error payloads in user-facing strings.
            assert!(!msg.contains("error:"));
        }
    }

    #[test]
    fn test_inconsistent_display_carries_reason() {
        let err = CartError::Inconsistent {
            reason: "item p1 was removed but could not be re-added".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cart update incomplete: item p1 was removed but could not be re-added"
        );
    }
}
