//! HTTP integration tests for the WTG webshop.
//!
//! The tests talk to a running webshop and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p wtg-cli -- migrate
//! cargo run -p wtg-cli -- user create -l 13370 -c "Test Klant" -e test@example.com -p testtest
//! cargo run -p wtg-cli -- user create -l 10000 -c "Test Admin" -p testtest --admin
//! cargo run -p wtg-webshop &
//! cargo test -p wtg-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `WTG_BASE_URL` - webshop under test (default `http://localhost:3000`)
//! - `WTG_TEST_LOGIN` / `WTG_TEST_PASSWORD` - customer account (default `13370` / `testtest`)
//! - `WTG_TEST_ADMIN_LOGIN` / `WTG_TEST_ADMIN_PASSWORD` - admin account (default `10000` / `testtest`)

use reqwest::{Client, Response, header::LOCATION, redirect::Policy};

/// Base URL of the webshop under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("WTG_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Customer credentials.
#[must_use]
pub fn customer_credentials() -> (String, String) {
    (
        env_or("WTG_TEST_LOGIN", "13370"),
        env_or("WTG_TEST_PASSWORD", "testtest"),
    )
}

/// Admin credentials.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        env_or("WTG_TEST_ADMIN_LOGIN", "10000"),
        env_or("WTG_TEST_ADMIN_PASSWORD", "testtest"),
    )
}

/// A cookie-keeping client that does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Log in and return the client holding the session cookie.
///
/// # Panics
///
/// Panics if the request fails or the login is rejected.
pub async fn logged_in(login: &str, password: &str) -> Client {
    let client = client();
    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("username", login), ("password", password)])
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(location(&resp).as_deref(), Some("/account"), "login rejected");
    client
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Fetch a page and return its body.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn page(client: &Client, path: &str) -> String {
    client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("Failed to fetch page")
        .text()
        .await
        .expect("Failed to read body")
}
