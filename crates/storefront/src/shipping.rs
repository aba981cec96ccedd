//! Shipping estimation.
//!
//! Translates {destination country, currency, cart contents} into a cost/ETA
//! quote, or a definitive "unavailable" signal. The estimator itself holds no
//! state - each call stands alone. Staleness across overlapping estimations
//! is handled by [`EstimateSlot`], owned by the checkout session: every
//! recomputation takes a monotonically increasing ticket, and a result is
//! applied only while its ticket is still the newest.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use opaline_core::{CountryCode, CurrencyCode, Money};

use crate::backend::{
    BackendClient, BackendError, DeliveryWindow, EstimateItem, EstimateRequest, EstimateResponse,
};
use crate::config::ShippingConfig;

// =============================================================================
// Quote States
// =============================================================================

/// A shipping quote in one of its four states.
///
/// `Unavailable` is terminal for the current (country, items) combination:
/// it must never be read as zero cost, and it blocks order submission.
/// `Error` is transient and retryable by re-triggering estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ShippingQuote {
    /// A request for the current inputs is in flight.
    Loading,
    /// The backend quoted the destination.
    Ready {
        /// Quoted cost in the requested currency.
        cost: Money,
        /// Delivery window in days, when the carrier provides one.
        estimated_days: Option<DeliveryWindow>,
    },
    /// The backend reported the destination as non-serviceable.
    Unavailable,
    /// The estimation failed for a transient reason.
    Error {
        /// Short, user-presentable description.
        message: String,
    },
}

impl ShippingQuote {
    /// Whether the quote is settled and usable for a total.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Whether the destination was reported non-serviceable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// The quoted cost, when settled.
    #[must_use]
    pub const fn cost(&self) -> Option<&Money> {
        match self {
            Self::Ready { cost, .. } => Some(cost),
            _ => None,
        }
    }
}

// =============================================================================
// Estimation Input
// =============================================================================

/// The input triple a quote is valid for.
///
/// Speed preference and markup are service configuration, not user input;
/// they are applied uniformly and deliberately excluded from the triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateInput {
    /// Destination country.
    pub country: CountryCode,
    /// Currency the quote should be expressed in.
    pub currency: CurrencyCode,
    /// Snapshot of the cart contents to quote for.
    pub items: Vec<EstimateItem>,
}

// =============================================================================
// Estimator
// =============================================================================

/// Stateless quote service over the backend client.
#[derive(Clone)]
pub struct ShippingEstimator {
    backend: BackendClient,
    preferred: String,
    markup_pct: Decimal,
}

impl ShippingEstimator {
    /// Create a new estimator.
    #[must_use]
    pub fn new(backend: BackendClient, shipping: &ShippingConfig) -> Self {
        Self {
            backend,
            preferred: shipping.preferred_speed.clone(),
            markup_pct: shipping.markup_pct,
        }
    }

    /// Request a quote for the given input triple.
    ///
    /// Never returns `Err`: every failure mode is a quote state. Transport
    /// and unexpected-status failures become `Error` (retryable); a
    /// non-serviceable destination becomes `Unavailable`.
    #[instrument(skip(self, input), fields(country = %input.country, currency = %input.currency))]
    pub async fn estimate(&self, input: &EstimateInput) -> ShippingQuote {
        let request = EstimateRequest {
            country_code: input.country.clone(),
            preferred: self.preferred.clone(),
            currency: input.currency,
            markup_pct: self.markup_pct,
            items: input.items.clone(),
        };

        match self.backend.estimate_shipping(&request).await {
            Ok(response) => normalize_quote(&response, input.currency),
            Err(BackendError::DestinationUnavailable) => ShippingQuote::Unavailable,
            Err(e) => {
                tracing::warn!(error = %e, "shipping estimation failed");
                ShippingQuote::Error {
                    message: "Shipping could not be calculated. Please try again.".to_string(),
                }
            }
        }
    }
}

/// Normalize a backend response into a `Ready` quote.
///
/// The cost is read from the response field matching the requested currency
/// exactly - there is no client-side conversion fallback. A missing currency
/// key resolves to zero and is logged as a data-contract violation, never
/// guessed from another currency.
fn normalize_quote(response: &EstimateResponse, currency: CurrencyCode) -> ShippingQuote {
    let amount = response
        .shipping_cost
        .get(currency.code())
        .copied()
        .unwrap_or_else(|| {
            tracing::error!(
                currency = %currency,
                available = ?response.shipping_cost.keys().collect::<Vec<_>>(),
                "shipping quote is missing the requested currency"
            );
            Decimal::ZERO
        });

    ShippingQuote::Ready {
        cost: Money::new(amount, currency),
        estimated_days: response.estimated_days,
    }
}

// =============================================================================
// Estimate Slot
// =============================================================================

/// Ticket identifying one outstanding estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateTicket(u64);

/// Holder of the current quote for one checkout session.
///
/// Implements supersede-not-queue: [`EstimateSlot::begin`] marks the slot
/// loading and issues a ticket; [`EstimateSlot::settle`] applies a result
/// only if its ticket is still the newest, discarding it otherwise. Earlier
/// in-flight requests are not cancelled - their results simply never land.
#[derive(Debug)]
pub struct EstimateSlot {
    seq: u64,
    quote: Option<ShippingQuote>,
}

impl EstimateSlot {
    /// A slot with no estimation started yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seq: 0,
            quote: None,
        }
    }

    /// Start a new estimation, superseding any outstanding one.
    pub fn begin(&mut self) -> EstimateTicket {
        self.seq += 1;
        self.quote = Some(ShippingQuote::Loading);
        EstimateTicket(self.seq)
    }

    /// Apply a settled quote if the ticket is still current.
    ///
    /// Returns `false` when the result was stale and discarded.
    pub fn settle(&mut self, ticket: EstimateTicket, quote: ShippingQuote) -> bool {
        if ticket.0 != self.seq {
            tracing::debug!(
                ticket = ticket.0,
                current = self.seq,
                "discarding stale shipping estimate"
            );
            return false;
        }
        self.quote = Some(quote);
        true
    }

    /// The current quote, if any estimation has been started.
    #[must_use]
    pub const fn quote(&self) -> Option<&ShippingQuote> {
        self.quote.as_ref()
    }

    /// Whether an estimation is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.quote, Some(ShippingQuote::Loading))
    }

    /// Forget any quote (cart emptied, session reset).
    pub fn clear(&mut self) {
        self.quote = None;
    }
}

impl Default for EstimateSlot {
    fn default() -> Self {
        Self::new()
    }
}
