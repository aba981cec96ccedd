//! Integration tests for Opaline.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and the backend order service, then the storefront
//! cargo run -p opaline-storefront
//!
//! # Run integration tests
//! cargo test -p opaline-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOREFRONT_TEST_URL` - Storefront base URL (default: http://localhost:3000)
//! - `BACKEND_TEST_TOKEN` - A backend-issued bearer token for a test customer
//!
//! Tests that need a signed-in customer bind `BACKEND_TEST_TOKEN` to a
//! session via `POST /auth/session`, exactly as the external sign-in flow
//! would. Each test uses its own cookie jar, so sessions never leak between
//! tests.

use reqwest::Client;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// The backend-issued bearer token used by authenticated tests.
///
/// # Panics
///
/// Panics when `BACKEND_TEST_TOKEN` is unset; the ignored tests require it.
#[must_use]
pub fn test_token() -> String {
    std::env::var("BACKEND_TEST_TOKEN")
        .expect("BACKEND_TEST_TOKEN must be set for integration tests")
}

/// A client with its own cookie jar (one session per test).
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Create a client and bind the test token to its session.
///
/// # Panics
///
/// Panics if the session cannot be established.
pub async fn signed_in_client() -> Client {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/auth/session"))
        .json(&serde_json::json!({ "token": test_token() }))
        .send()
        .await
        .expect("Failed to establish session");
    assert!(
        resp.status().is_success(),
        "session establishment failed: {}",
        resp.status()
    );

    client
}

/// Remove every item currently in the session's cart.
///
/// # Panics
///
/// Panics if the cart cannot be fetched or emptied.
pub async fn empty_cart(client: &Client) {
    let base_url = storefront_base_url();

    let cart: serde_json::Value = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart")
        .json()
        .await
        .expect("Failed to parse cart");

    for item in cart["items"].as_array().cloned().unwrap_or_default() {
        let resp = client
            .post(format!("{base_url}/cart/remove"))
            .json(&serde_json::json!({ "product_id": item["product_id"] }))
            .send()
            .await
            .expect("Failed to remove item");
        assert!(resp.status().is_success());
    }
}
