//! Integration tests for cart operations.
//!
//! These tests require:
//! - A running backend order service with test data
//! - The storefront running (cargo run -p opaline-storefront)
//! - `BACKEND_TEST_TOKEN` set to a valid test-customer token
//!
//! Run with: cargo test -p opaline-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use opaline_integration_tests::{client, empty_cart, signed_in_client, storefront_base_url};

/// A product known to exist in the backend's test catalog.
const TEST_PRODUCT: &str = "test-ring-01";
const OTHER_PRODUCT: &str = "test-chain-02";

async fn fetch_cart(client: &Client) -> Value {
    let base_url = storefront_base_url();
    client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart")
        .json()
        .await
        .expect("Failed to parse cart")
}

fn quantity_of(cart: &Value, product_id: &str) -> Option<u64> {
    cart["items"]
        .as_array()?
        .iter()
        .find(|item| item["product_id"] == product_id)
        .and_then(|item| item["quantity"].as_u64())
}

// ============================================================================
// Anonymous Behavior
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_cart_count_without_session_is_zero() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get count");

    // Absence of a session is a zero count, never an error.
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse count");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_add_without_session_is_refused_locally() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send add");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert!(!body["error"].as_str().expect("error message").is_empty());
}

// ============================================================================
// Add / Fetch
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_add_then_fetch_yields_exact_quantity() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add");
    assert_eq!(resp.status(), StatusCode::OK);

    // Not doubled, not merged oddly: exactly 2.
    let cart = fetch_cart(&client).await;
    assert_eq!(quantity_of(&cart, TEST_PRODUCT), Some(2));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_re_adding_updates_quantity_never_duplicates() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    for _ in 0..2 {
        let resp = client
            .post(format!("{base_url}/cart/add"))
            .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 1 }))
            .send()
            .await
            .expect("Failed to add");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart = fetch_cart(&client).await;
    let lines_for_product = cart["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter(|item| item["product_id"] == TEST_PRODUCT)
        .count();
    assert_eq!(lines_for_product, 1, "items must stay unique by product_id");
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_unrelated_products_are_unaffected() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    for (product, quantity) in [(TEST_PRODUCT, 2), (OTHER_PRODUCT, 1)] {
        let resp = client
            .post(format!("{base_url}/cart/add"))
            .json(&json!({ "product_id": product, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Changing one product leaves the other untouched.
    let resp = client
        .post(format!("{base_url}/cart/update"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 5 }))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart = fetch_cart(&client).await;
    assert_eq!(quantity_of(&cart, TEST_PRODUCT), Some(5));
    assert_eq!(quantity_of(&cart, OTHER_PRODUCT), Some(1));
}

// ============================================================================
// Update Quantity
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_update_equals_remove_then_add() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/cart/update"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 4 }))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);

    // Final state equals removeItem + addItem(4).
    let cart = fetch_cart(&client).await;
    assert_eq!(quantity_of(&cart, TEST_PRODUCT), Some(4));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_update_to_zero_is_a_no_op() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 3 }))
        .send()
        .await
        .expect("Failed to add");
    assert_eq!(resp.status(), StatusCode::OK);

    // Decreasing to zero is not allowed through this path; removal is a
    // distinct operation.
    let resp = client
        .post(format!("{base_url}/cart/update"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart = fetch_cart(&client).await;
    assert_eq!(quantity_of(&cart, TEST_PRODUCT), Some(3));
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_remove_is_idempotent() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({ "product_id": TEST_PRODUCT, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add");
    assert_eq!(resp.status(), StatusCode::OK);

    // Remove twice; the second remove targets an absent product.
    for _ in 0..2 {
        let resp = client
            .post(format!("{base_url}/cart/remove"))
            .json(&json!({ "product_id": TEST_PRODUCT }))
            .send()
            .await
            .expect("Failed to remove");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // The cart remains fetchable and consistent.
    let cart = fetch_cart(&client).await;
    assert_eq!(quantity_of(&cart, TEST_PRODUCT), None);
    assert_eq!(cart["item_count"], 0);
}

// ============================================================================
// Count
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_count_is_sum_of_quantities() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    empty_cart(&client).await;

    for (product, quantity) in [(TEST_PRODUCT, 2), (OTHER_PRODUCT, 3)] {
        let resp = client
            .post(format!("{base_url}/cart/add"))
            .json(&json!({ "product_id": product, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get count");
    let body: Value = resp.json().await.expect("Failed to parse count");
    assert_eq!(body["count"], 5);
}
