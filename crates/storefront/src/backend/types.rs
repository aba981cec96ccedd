//! Wire types for the backend order service.
//!
//! These mirror the backend's JSON contract. Amounts are `rust_decimal`
//! decimals; the `serde-with-str` feature keeps them as strings on the wire
//! so no precision is lost in transit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use opaline_core::{CountryCode, CurrencyCode, Money, OrderId, ProductId};

// =============================================================================
// Cart Types
// =============================================================================

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog reference for the line.
    pub product_id: ProductId,
    /// Units of the product; the backend never returns a zero-quantity line.
    pub quantity: u32,
    /// Unit price captured when the item was added, in the store currency.
    pub price: Decimal,
}

/// The authenticated user's server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart lines, unique by `product_id`.
    pub items: Vec<CartItem>,
    /// Server-computed sum of `price * quantity`, in the store currency.
    pub total_amount: Decimal,
    /// The store's base currency.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Cart {
    /// An empty cart in the given currency.
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            currency,
        }
    }

    /// Total number of units across all lines (the badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// The server-computed subtotal as [`Money`].
    #[must_use]
    pub const fn subtotal(&self) -> Money {
        Money::new(self.total_amount, self.currency)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The quantity for a product, or `None` when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map(|item| item.quantity)
    }
}

// =============================================================================
// Shipping Estimate Types
// =============================================================================

/// Request body for `POST /shipping/estimate`.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateRequest {
    /// Destination country.
    pub country_code: CountryCode,
    /// Speed tier preference (e.g., "fastest").
    pub preferred: String,
    /// Currency the quote should be expressed in.
    pub currency: CurrencyCode,
    /// Markup percentage applied server-side.
    pub markup_pct: Decimal,
    /// The (product, quantity) pairs to quote for.
    pub items: Vec<EstimateItem>,
}

/// One (product, quantity) pair in an estimate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateItem {
    /// Catalog reference.
    pub product_id: ProductId,
    /// Units to ship.
    pub quantity: u32,
}

impl From<&CartItem> for EstimateItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        }
    }
}

/// Response body for `POST /shipping/estimate`.
///
/// `shipping_cost` is keyed by ISO 4217 currency code; the cost must be read
/// from the key matching the requested currency exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateResponse {
    /// Quoted cost per currency code.
    pub shipping_cost: HashMap<String, Decimal>,
    /// Estimated delivery window in days, when the carrier provides one.
    #[serde(default)]
    pub estimated_days: Option<DeliveryWindow>,
}

/// Estimated delivery window in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    /// Earliest expected delivery, in days.
    pub min: u32,
    /// Latest expected delivery, in days.
    pub max: u32,
}

// =============================================================================
// Geolocation Types
// =============================================================================

/// Response body for `GET /geo/detect`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoDetectResponse {
    /// Detected country, when the lookup succeeded.
    #[serde(default)]
    pub country_code: Option<String>,
}

// =============================================================================
// Order Types
// =============================================================================

/// A shipping address, as submitted with an order or stored on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    /// Street address, first line.
    pub line1: String,
    /// Street address, second line.
    #[serde(default)]
    pub line2: Option<String>,
    /// City.
    pub city: String,
    /// Postal or ZIP code.
    pub postal_code: String,
    /// Destination country.
    pub country_code: CountryCode,
    /// Contact phone number for the carrier.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Request body for `POST /orders`.
///
/// The backend resolves the items from the caller's server-side cart; the
/// payload carries only address and payment selection.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Where to ship the order.
    pub shipping_address: ShippingAddress,
    /// Payment method identifier understood by the backend.
    pub payment_method: String,
}

/// Response body for `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfirmation {
    /// Identifier of the created order.
    pub order_id: OrderId,
    /// When the backend recorded the order.
    #[serde(default)]
    pub placed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Profile Types
// =============================================================================

/// The customer profile held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name shown in the account area.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Default shipping address.
    #[serde(default)]
    pub address: Option<ShippingAddress>,
}

/// Request body for `PUT /profile`.
///
/// The address sub-object is a full replace; the storefront always sends the
/// complete address rather than a partial patch.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    /// The replacement default shipping address.
    pub address: ShippingAddress,
}
