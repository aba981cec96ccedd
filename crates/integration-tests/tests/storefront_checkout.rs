//! Integration tests for checkout orchestration.
//!
//! These tests require:
//! - A running backend order service with test data, including a country
//!   the backend refuses to ship to (`UNSERVICEABLE_COUNTRY`)
//! - The storefront running (cargo run -p opaline-storefront)
//! - `BACKEND_TEST_TOKEN` set to a valid test-customer token
//!
//! Run with: cargo test -p opaline-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use opaline_integration_tests::{empty_cart, signed_in_client, storefront_base_url};

const TEST_PRODUCT: &str = "test-ring-01";

/// A destination the backend serves.
const SERVICEABLE_COUNTRY: &str = "US";
/// A destination the backend reports as non-serviceable.
const UNSERVICEABLE_COUNTRY: &str = "AQ";

fn test_address(country: &str) -> Value {
    json!({
        "name": "Test Customer",
        "line1": "1 Test Street",
        "city": "Testville",
        "postal_code": "00000",
        "country_code": country
    })
}

async fn add_test_item(client: &Client) {
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add");
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn set_destination(client: &Client, country: &str) -> Value {
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/checkout/destination"))
        .json(&json!({ "country": country }))
        .send()
        .await
        .expect("Failed to set destination");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse checkout view")
}

// ============================================================================
// Totals
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_total_is_subtotal_plus_shipping_when_ready() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    add_test_item(&client).await;

    let view = set_destination(&client, SERVICEABLE_COUNTRY).await;

    assert_eq!(view["shipping"]["state"], "ready");
    assert!(view["can_submit"].as_bool().expect("can_submit"));

    // total = subtotal + shipping cost, same currency throughout.
    let subtotal: f64 = view["subtotal"]["amount"]
        .as_str()
        .expect("subtotal amount")
        .parse()
        .expect("decimal");
    let shipping: f64 = view["shipping"]["cost"]["amount"]
        .as_str()
        .expect("shipping amount")
        .parse()
        .expect("decimal");
    let total: f64 = view["total"]["amount"]
        .as_str()
        .expect("total amount")
        .parse()
        .expect("decimal");
    assert!((total - (subtotal + shipping)).abs() < 0.001);
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_empty_cart_has_no_total_and_cannot_submit() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to get checkout");
    assert_eq!(resp.status(), StatusCode::OK);

    let view: Value = resp.json().await.expect("Failed to parse view");
    assert_eq!(view["total"], Value::Null);
    assert_eq!(view["can_submit"], false);
}

// ============================================================================
// Unavailable Destinations
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_unavailable_destination_blocks_submission() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    add_test_item(&client).await;

    let view = set_destination(&client, UNSERVICEABLE_COUNTRY).await;
    assert_eq!(view["shipping"]["state"], "unavailable");
    assert_eq!(view["can_submit"], false);
    assert_eq!(view["total"], Value::Null);

    // Submission is rejected client-side; the storefront never calls the
    // backend order endpoint for a destination it knows cannot ship.
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/checkout/order"))
        .json(&json!({
            "shipping_address": test_address(UNSERVICEABLE_COUNTRY),
            "payment_method": "test-card"
        }))
        .send()
        .await
        .expect("Failed to send order");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Sorry, we can't ship to this destination.");
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_country_switch_shows_final_country_state() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    add_test_item(&client).await;

    // Select a serviceable country, then switch to an unserviceable one.
    // The final view must reflect the second choice; the first quote must
    // not survive the switch.
    set_destination(&client, SERVICEABLE_COUNTRY).await;
    let view = set_destination(&client, UNSERVICEABLE_COUNTRY).await;

    assert_eq!(view["destination"], UNSERVICEABLE_COUNTRY);
    assert_eq!(view["shipping"]["state"], "unavailable");
    assert_eq!(view["can_submit"], false);
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend; places a real test order"]
async fn test_submit_places_order_and_clears_cart() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    add_test_item(&client).await;

    let view = set_destination(&client, SERVICEABLE_COUNTRY).await;
    assert!(view["can_submit"].as_bool().expect("can_submit"));

    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/checkout/order"))
        .json(&json!({
            "shipping_address": test_address(SERVICEABLE_COUNTRY),
            "payment_method": "test-card"
        }))
        .send()
        .await
        .expect("Failed to submit order");

    assert_eq!(resp.status(), StatusCode::OK);
    let placed: Value = resp.json().await.expect("Failed to parse confirmation");
    assert!(
        !placed["order_id"]
            .as_str()
            .expect("order id")
            .is_empty()
    );

    // The server-side cart was consumed by the order.
    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get count");
    let body: Value = resp.json().await.expect("Failed to parse count");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_address_country_must_match_destination() {
    let client = signed_in_client().await;
    empty_cart(&client).await;
    add_test_item(&client).await;

    let view = set_destination(&client, SERVICEABLE_COUNTRY).await;
    assert!(view["can_submit"].as_bool().expect("can_submit"));

    // Quote says US; address says DE. The storefront refuses rather than
    // submitting an order whose total no longer matches its quote.
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/checkout/order"))
        .json(&json!({
            "shipping_address": test_address("DE"),
            "payment_method": "test-card"
        }))
        .send()
        .await
        .expect("Failed to send order");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
