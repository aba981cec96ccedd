//! Checkout orchestration.
//!
//! Composes the cart store and the shipping estimator into a submittable
//! order total, and owns the gating decision: an order may only be submitted
//! while the shipping quote for the current inputs is `ready`. A
//! non-serviceable destination is rejected client-side - the backend is
//! never called for an order we already know cannot ship.
//!
//! Each signed-in customer gets one [`CheckoutState`] held in a process-wide
//! cache with an idle TTL, so abandoned checkouts expire on their own.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use opaline_core::{CountryCode, CurrencyCode, Money, OrderId};

use crate::backend::{BackendClient, BackendError, Cart, OrderRequest, ShippingAddress};
use crate::cart::{CartError, CartStore};
use crate::config::ShippingConfig;
use crate::models::AccessToken;
use crate::shipping::{EstimateInput, EstimateSlot, ShippingEstimator, ShippingQuote};

/// Abandoned checkouts expire after half an hour of inactivity.
const SESSION_TTI: Duration = Duration::from_secs(30 * 60);
const SESSION_CAPACITY: u64 = 10_000;

// =============================================================================
// Phases
// =============================================================================

/// Where a checkout session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// No estimable cart yet (empty cart or nothing started).
    Idle,
    /// A shipping estimation is in flight.
    Estimating,
    /// The latest estimation settled (ready, unavailable, or error).
    EstimateSettled,
    /// An order submission is in flight.
    Submitting,
    /// The backend confirmed the order. Terminal.
    Placed,
}

// =============================================================================
// Submission Gating
// =============================================================================

/// Why submission is currently blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlock {
    /// The cart has no items.
    EmptyCart,
    /// No estimation has been started for the current inputs.
    NoEstimate,
    /// The estimation for the current inputs has not settled yet.
    EstimateInFlight,
    /// The backend reported the destination as non-serviceable.
    ShippingUnavailable,
    /// The estimation failed; retry by re-triggering it.
    EstimateFailed,
    /// Quote and subtotal are in different currencies; no implicit
    /// conversion is performed.
    CurrencyMismatch,
    /// A submission is already in flight.
    SubmissionInFlight,
    /// The order was already placed.
    AlreadyPlaced,
}

impl SubmitBlock {
    /// Short, user-presentable message for this block.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyCart => "Your bag is empty.",
            Self::NoEstimate | Self::EstimateInFlight => "Calculating shipping...",
            Self::ShippingUnavailable => "Sorry, we can't ship to this destination.",
            Self::EstimateFailed => "Shipping could not be calculated. Please try again.",
            Self::CurrencyMismatch => "Totals are being recalculated for your currency.",
            Self::SubmissionInFlight => "Your order is being placed...",
            Self::AlreadyPlaced => "This order has already been placed.",
        }
    }
}

/// Errors produced by checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No signed-in customer.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Submission is blocked client-side; no backend call was made.
    #[error("order not submittable: {}", .0.user_message())]
    NotSubmittable(SubmitBlock),

    /// The shipping address names a different country than the one the
    /// quote was computed for.
    #[error("shipping address country does not match the quoted destination")]
    DestinationMismatch,

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// =============================================================================
// Per-Session State
// =============================================================================

/// The state of one customer's checkout session.
#[derive(Debug)]
pub struct CheckoutState {
    phase: CheckoutPhase,
    destination: CountryCode,
    currency: CurrencyCode,
    cart: Cart,
    slot: EstimateSlot,
    last_error: Option<String>,
    placed_order: Option<OrderId>,
}

impl CheckoutState {
    /// A fresh session for the given destination and currency.
    #[must_use]
    pub fn new(destination: CountryCode, currency: CurrencyCode) -> Self {
        Self {
            phase: CheckoutPhase::Idle,
            destination,
            currency,
            cart: Cart::empty(currency),
            slot: EstimateSlot::new(),
            last_error: None,
            placed_order: None,
        }
    }

    /// The order total, when submission is currently permitted.
    ///
    /// Permitted means: items in the cart, the quote for the current inputs
    /// is `ready` in the subtotal's currency, and no submission is already
    /// in flight or completed. Everything else reports why not.
    ///
    /// # Errors
    ///
    /// Returns the blocking condition.
    pub fn eligibility(&self) -> Result<Money, SubmitBlock> {
        match self.phase {
            CheckoutPhase::Submitting => return Err(SubmitBlock::SubmissionInFlight),
            CheckoutPhase::Placed => return Err(SubmitBlock::AlreadyPlaced),
            CheckoutPhase::Idle | CheckoutPhase::Estimating | CheckoutPhase::EstimateSettled => {}
        }

        if self.cart.is_empty() {
            return Err(SubmitBlock::EmptyCart);
        }

        match self.slot.quote() {
            None => Err(SubmitBlock::NoEstimate),
            Some(ShippingQuote::Loading) => Err(SubmitBlock::EstimateInFlight),
            Some(ShippingQuote::Unavailable) => Err(SubmitBlock::ShippingUnavailable),
            Some(ShippingQuote::Error { .. }) => Err(SubmitBlock::EstimateFailed),
            Some(ShippingQuote::Ready { cost, .. }) => {
                self.cart.subtotal().checked_add(cost).ok_or_else(|| {
                    tracing::warn!(
                        subtotal_currency = %self.cart.subtotal().currency,
                        quote_currency = %cost.currency,
                        "quote currency does not match subtotal currency"
                    );
                    SubmitBlock::CurrencyMismatch
                })
            }
        }
    }

    /// Snapshot for the presentation layer.
    #[must_use]
    pub fn view(&self) -> CheckoutView {
        let eligibility = self.eligibility();
        let message = self
            .last_error
            .clone()
            .or_else(|| eligibility.as_ref().err().map(|b| b.user_message().to_string()));

        CheckoutView {
            phase: self.phase,
            destination: self.destination.clone(),
            currency: self.currency,
            subtotal: self.cart.subtotal(),
            item_count: self.cart.item_count(),
            shipping: self.slot.quote().cloned(),
            total: eligibility.as_ref().ok().copied(),
            can_submit: eligibility.is_ok(),
            order_id: self.placed_order.clone(),
            message,
        }
    }
}

/// Serializable checkout summary handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    /// Lifecycle phase.
    pub phase: CheckoutPhase,
    /// Destination country the quote applies to.
    pub destination: CountryCode,
    /// Selected currency.
    pub currency: CurrencyCode,
    /// Server-computed cart subtotal.
    pub subtotal: Money,
    /// Units in the cart.
    pub item_count: u32,
    /// Current shipping quote, if estimation has started.
    pub shipping: Option<ShippingQuote>,
    /// Subtotal + shipping - present only while the quote is `ready`.
    /// While it is absent the UI must indicate shipping is not finalized,
    /// never assume zero.
    pub total: Option<Money>,
    /// Whether `POST /checkout/order` would be accepted right now.
    pub can_submit: bool,
    /// Identifier of the placed order, once placed.
    pub order_id: Option<OrderId>,
    /// Short human-readable status or error, when there is one.
    pub message: Option<String>,
}

/// Response for a successfully placed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPlacedView {
    /// Identifier of the created order.
    pub order_id: OrderId,
    /// The total that was in effect at submission.
    pub total: Money,
    /// When the backend recorded the order.
    pub placed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Coordinates cart state and shipping quotes into a submittable order.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    inner: Arc<CheckoutOrchestratorInner>,
}

struct CheckoutOrchestratorInner {
    backend: BackendClient,
    estimator: ShippingEstimator,
    carts: CartStore,
    sessions: Cache<String, Arc<Mutex<CheckoutState>>>,
    fallback_country: CountryCode,
    base_currency: CurrencyCode,
}

impl CheckoutOrchestrator {
    /// Create a new orchestrator.
    #[must_use]
    pub fn new(
        backend: BackendClient,
        estimator: ShippingEstimator,
        carts: CartStore,
        shipping: &ShippingConfig,
        base_currency: CurrencyCode,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(SESSION_CAPACITY)
            .time_to_idle(SESSION_TTI)
            .build();

        Self {
            inner: Arc::new(CheckoutOrchestratorInner {
                backend,
                estimator,
                carts,
                sessions,
                fallback_country: shipping.fallback_country.clone(),
                base_currency,
            }),
        }
    }

    /// Get or create the checkout session for a customer.
    ///
    /// New sessions pre-fill the destination from a best-effort geo lookup;
    /// detection failure falls back to the configured country and never
    /// blocks the flow.
    async fn session(&self, token: &AccessToken) -> Arc<Mutex<CheckoutState>> {
        let key = token.cache_key();
        self.inner
            .sessions
            .get_with(key, async {
                let destination = match self.inner.backend.detect_country().await {
                    Ok(Some(country)) => country,
                    Ok(None) => self.inner.fallback_country.clone(),
                    Err(e) => {
                        tracing::debug!(error = %e, "country detection failed; using fallback");
                        self.inner.fallback_country.clone()
                    }
                };
                Arc::new(Mutex::new(CheckoutState::new(
                    destination,
                    self.inner.base_currency,
                )))
            })
            .await
    }

    /// Refresh the session's cart snapshot from the authoritative store.
    ///
    /// Returns whether the contents changed since the last snapshot.
    async fn sync_cart(
        &self,
        state: &Arc<Mutex<CheckoutState>>,
        token: &AccessToken,
    ) -> Result<bool, CheckoutError> {
        let cart = self.inner.carts.fetch_cart(token).await?;
        let mut s = state.lock().await;
        let changed = s.cart.items != cart.items;
        s.cart = cart;
        Ok(changed)
    }

    /// Run one estimation for the session's current inputs.
    ///
    /// `prepare` mutates the state (e.g., a destination change) under the
    /// same lock that issues the ticket, so the snapshotted input triple
    /// always matches the state the quote will be judged against.
    ///
    /// The state lock is held only to snapshot the input triple and to
    /// settle the result - never across the network call. Overlapping
    /// estimations therefore race for real, and the slot's ticket decides
    /// which result lands.
    async fn reestimate(
        &self,
        state: &Arc<Mutex<CheckoutState>>,
        prepare: impl FnOnce(&mut CheckoutState),
    ) {
        let (ticket, input) = {
            let mut s = state.lock().await;
            prepare(&mut s);
            s.last_error = None;
            if s.cart.is_empty() {
                s.slot.clear();
                s.phase = CheckoutPhase::Idle;
                return;
            }
            s.phase = CheckoutPhase::Estimating;
            let ticket = s.slot.begin();
            let input = EstimateInput {
                country: s.destination.clone(),
                currency: s.currency,
                items: s.cart.items.iter().map(Into::into).collect(),
            };
            (ticket, input)
        };

        let quote = self.inner.estimator.estimate(&input).await;

        let mut s = state.lock().await;
        if s.slot.settle(ticket, quote) {
            s.phase = CheckoutPhase::EstimateSettled;
        }
        // A stale result changes nothing; the newer estimation settles the
        // phase when it lands.
    }

    /// Enter (or return to) checkout.
    ///
    /// Syncs the cart snapshot and re-triggers estimation when the contents
    /// changed or no quote exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    #[instrument(skip(self, token))]
    pub async fn checkout_view(&self, token: &AccessToken) -> Result<CheckoutView, CheckoutError> {
        let state = self.session(token).await;
        let changed = self.sync_cart(&state, token).await?;

        let needs_estimate = {
            let s = state.lock().await;
            changed || s.slot.quote().is_none() || s.cart.is_empty()
        };
        if needs_estimate {
            self.reestimate(&state, |_| {}).await;
        }

        let view = state.lock().await.view();
        Ok(view)
    }

    /// Change destination country and currency, superseding any in-flight
    /// estimation.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    #[instrument(skip(self, token), fields(country = %country, currency = %currency))]
    pub async fn set_destination(
        &self,
        token: &AccessToken,
        country: CountryCode,
        currency: CurrencyCode,
    ) -> Result<CheckoutView, CheckoutError> {
        let state = self.session(token).await;
        self.sync_cart(&state, token).await?;

        self.reestimate(&state, |s| {
            s.destination = country;
            s.currency = currency;
        })
        .await;
        let view = state.lock().await.view();
        Ok(view)
    }

    /// Re-trigger estimation for the current inputs.
    ///
    /// This is the retry path for the `error` quote state; it also picks up
    /// cart changes made since the last estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    #[instrument(skip(self, token))]
    pub async fn refresh(&self, token: &AccessToken) -> Result<CheckoutView, CheckoutError> {
        let state = self.session(token).await;
        self.sync_cart(&state, token).await?;
        self.reestimate(&state, |_| {}).await;
        let view = state.lock().await.view();
        Ok(view)
    }

    /// Submit the order.
    ///
    /// Gating happens here, before any network call: submission proceeds
    /// only when [`CheckoutState::eligibility`] yields a total. On backend
    /// rejection the session returns to `EstimateSettled` with the cart and
    /// estimate preserved, so the customer can retry without re-entering
    /// anything. The order counts as placed only on backend confirmation.
    ///
    /// # Errors
    ///
    /// `NotSubmittable` when gated, `DestinationMismatch` when the address
    /// country differs from the quoted destination, otherwise the backend
    /// failure.
    #[instrument(skip(self, token, shipping_address, payment_method))]
    pub async fn submit(
        &self,
        token: &AccessToken,
        shipping_address: ShippingAddress,
        payment_method: String,
    ) -> Result<OrderPlacedView, CheckoutError> {
        let state = self.session(token).await;

        let (total, order) = {
            let mut s = state.lock().await;
            let total = s.eligibility().map_err(CheckoutError::NotSubmittable)?;
            if shipping_address.country_code != s.destination {
                return Err(CheckoutError::DestinationMismatch);
            }
            s.phase = CheckoutPhase::Submitting;
            s.last_error = None;
            (
                total,
                OrderRequest {
                    shipping_address,
                    payment_method,
                },
            )
        };

        match self.inner.backend.submit_order(token, &order).await {
            Ok(confirmation) => {
                {
                    let mut s = state.lock().await;
                    s.phase = CheckoutPhase::Placed;
                    s.placed_order = Some(confirmation.order_id.clone());
                }
                // The server-side cart was consumed by the order; drop the
                // mirror and the finished checkout session.
                self.inner.carts.invalidate(token).await;
                self.inner.sessions.invalidate(&token.cache_key()).await;

                Ok(OrderPlacedView {
                    order_id: confirmation.order_id,
                    total,
                    placed_at: confirmation.placed_at,
                })
            }
            Err(e) => {
                let mut s = state.lock().await;
                s.phase = CheckoutPhase::EstimateSettled;
                s.last_error =
                    Some("We couldn't place your order. Please try again.".to_string());
                Err(e.into())
            }
        }
    }

    /// Drop a customer's checkout session (sign-out).
    pub async fn invalidate(&self, token: &AccessToken) {
        self.inner.sessions.invalidate(&token.cache_key()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CartItem;
    use opaline_core::ProductId;
    use rust_decimal_macros::dec;

    fn state_with_cart(subtotal: rust_decimal::Decimal) -> CheckoutState {
        let mut state = CheckoutState::new(
            CountryCode::parse("US").expect("valid"),
            CurrencyCode::USD,
        );
        state.cart = Cart {
            items: vec![CartItem {
                product_id: ProductId::new("ring-01"),
                quantity: 1,
                price: subtotal,
            }],
            total_amount: subtotal,
            currency: CurrencyCode::USD,
        };
        state
    }

    fn settle(state: &mut CheckoutState, quote: ShippingQuote) {
        let ticket = state.slot.begin();
        state.slot.settle(ticket, quote);
        state.phase = CheckoutPhase::EstimateSettled;
    }

    #[test]
    fn test_total_is_subtotal_plus_shipping_when_ready() {
        let mut state = state_with_cart(dec!(450.00));
        settle(
            &mut state,
            ShippingQuote::Ready {
                cost: Money::new(dec!(35.00), CurrencyCode::USD),
                estimated_days: None,
            },
        );

        let total = state.eligibility().expect("submittable");
        assert_eq!(total.amount, dec!(485.00));
        assert_eq!(total.currency, CurrencyCode::USD);

        let view = state.view();
        assert!(view.can_submit);
        assert_eq!(view.total.map(|t| t.amount), Some(dec!(485.00)));
    }

    #[test]
    fn test_unavailable_blocks_submission() {
        let mut state = state_with_cart(dec!(450.00));
        settle(&mut state, ShippingQuote::Unavailable);

        assert_eq!(
            state.eligibility(),
            Err(SubmitBlock::ShippingUnavailable)
        );

        let view = state.view();
        assert!(!view.can_submit);
        assert!(view.total.is_none());
        assert_eq!(
            view.message.as_deref(),
            Some("Sorry, we can't ship to this destination.")
        );
    }

    #[test]
    fn test_loading_reports_total_not_finalized() {
        let mut state = state_with_cart(dec!(450.00));
        state.slot.begin();
        state.phase = CheckoutPhase::Estimating;

        assert_eq!(state.eligibility(), Err(SubmitBlock::EstimateInFlight));

        // The view must not assume zero shipping while loading.
        let view = state.view();
        assert!(view.total.is_none());
        assert_eq!(view.shipping, Some(ShippingQuote::Loading));
        assert_eq!(view.message.as_deref(), Some("Calculating shipping..."));
    }

    #[test]
    fn test_estimate_error_is_retryable_not_zero_cost() {
        let mut state = state_with_cart(dec!(100.00));
        settle(
            &mut state,
            ShippingQuote::Error {
                message: "Shipping could not be calculated. Please try again.".to_string(),
            },
        );

        assert_eq!(state.eligibility(), Err(SubmitBlock::EstimateFailed));
        assert!(state.view().total.is_none());
    }

    #[test]
    fn test_empty_cart_blocks_submission() {
        let state = CheckoutState::new(
            CountryCode::parse("US").expect("valid"),
            CurrencyCode::USD,
        );
        assert_eq!(state.eligibility(), Err(SubmitBlock::EmptyCart));
    }

    #[test]
    fn test_currency_mismatch_is_not_summed() {
        let mut state = state_with_cart(dec!(450.00));
        settle(
            &mut state,
            ShippingQuote::Ready {
                cost: Money::new(dec!(35.00), CurrencyCode::EUR),
                estimated_days: None,
            },
        );

        assert_eq!(state.eligibility(), Err(SubmitBlock::CurrencyMismatch));
        assert!(state.view().total.is_none());
    }

    #[test]
    fn test_in_flight_submission_blocks_resubmit() {
        let mut state = state_with_cart(dec!(100.00));
        settle(
            &mut state,
            ShippingQuote::Ready {
                cost: Money::new(dec!(5.00), CurrencyCode::USD),
                estimated_days: None,
            },
        );

        state.phase = CheckoutPhase::Submitting;
        assert_eq!(state.eligibility(), Err(SubmitBlock::SubmissionInFlight));

        state.phase = CheckoutPhase::Placed;
        assert_eq!(state.eligibility(), Err(SubmitBlock::AlreadyPlaced));
    }

    #[test]
    fn test_backend_rejection_preserves_cart_and_estimate() {
        // Simulates the submit failure path: phase returns to settled with
        // the error surfaced, cart and quote untouched.
        let mut state = state_with_cart(dec!(450.00));
        settle(
            &mut state,
            ShippingQuote::Ready {
                cost: Money::new(dec!(35.00), CurrencyCode::USD),
                estimated_days: None,
            },
        );

        state.phase = CheckoutPhase::Submitting;
        state.phase = CheckoutPhase::EstimateSettled;
        state.last_error = Some("We couldn't place your order. Please try again.".to_string());

        let view = state.view();
        assert!(view.can_submit);
        assert_eq!(view.total.map(|t| t.amount), Some(dec!(485.00)));
        assert_eq!(
            view.message.as_deref(),
            Some("We couldn't place your order. Please try again.")
        );
    }

    #[test]
    fn test_view_serializes_quote_state_for_the_ui() {
        let mut state = state_with_cart(dec!(450.00));
        settle(&mut state, ShippingQuote::Unavailable);

        let json = serde_json::to_value(state.view()).expect("serialize");
        assert_eq!(json["phase"], "estimate_settled");
        assert_eq!(json["shipping"]["state"], "unavailable");
        assert_eq!(json["can_submit"], false);
        assert_eq!(json["total"], serde_json::Value::Null);
    }
}
