//! `GET /admin/getUserData` replies.
//!
//! Requires a running webshop with the test accounts; see the crate docs.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use wtg_integration_tests::{admin_credentials, base_url, customer_credentials, logged_in};

async fn admin() -> Client {
    let (login, password) = admin_credentials();
    logged_in(&login, &password).await
}

async fn user_data(client: &Client, query: &str) -> (StatusCode, Value) {
    let resp = client
        .get(format!("{}/admin/getUserData{query}", base_url()))
        .send()
        .await
        .expect("Failed to get user data");
    let status = resp.status();
    let body = resp.json().await.expect("Reply is not JSON");
    (status, body)
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_existing_user() {
    let (login, _) = customer_credentials();
    let client = admin().await;

    let (status, body) = user_data(&client, &format!("?id={login}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("User details for user {login}"));
    assert_eq!(body["payload"]["login"], login.as_str());
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_prefix_of_login_is_not_found() {
    let client = admin().await;

    let (status, body) = user_data(&client, "?id=1337").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No user found with login 1337");
    assert!(body.get("payload").is_none());
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_reversed_login_is_not_found() {
    let client = admin().await;

    let (_, body) = user_data(&client, "?id=07331").await;

    assert_eq!(body["message"], "No user found with login 07331");
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_missing_id() {
    let client = admin().await;

    let (status, body) = user_data(&client, "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing request parameter: `id`");
}
