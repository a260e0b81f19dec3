//! Login, logout and access control.
//!
//! Requires a running webshop with the test accounts; see the crate docs.

use reqwest::StatusCode;
use wtg_integration_tests::{
    admin_credentials, base_url, client, customer_credentials, location, logged_in, page,
};

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to call readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_account_requires_login() {
    let resp = client()
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("Failed to get account");

    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_wrong_password_shows_error() {
    let (login, _) = customer_credentials();
    let client = client();
    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("username", login.as_str()), ("password", "definitely wrong")])
        .send()
        .await
        .expect("Failed to post login");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Gebruikersnaam en/of wachtwoord onjuist"));
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_login_then_logout() {
    let (login, password) = customer_credentials();
    let client = logged_in(&login, &password).await;

    let body = page(&client, "/account").await;
    assert!(body.contains(&login));

    let resp = client
        .get(format!("{}/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let resp = client
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("Failed to get account");
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_customer_cannot_open_admin() {
    let (login, password) = customer_credentials();
    let client = logged_in(&login, &password).await;

    let resp = client
        .get(format!("{}/admin", base_url()))
        .send()
        .await
        .expect("Failed to get admin");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires a running webshop"]
async fn test_admin_overview() {
    let (login, password) = admin_credentials();
    let client = logged_in(&login, &password).await;

    let body = page(&client, "/admin").await;
    assert!(body.contains("gebruikers"));
    assert!(body.contains("kortingen"));
}
