//! End-to-end tests for the admin session API and the request gate.

use folio_integration_tests::{ADMIN_EMAIL, TestServer, with_token};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn validate(server: &TestServer, token: &folio_core::AdminToken) -> StatusCode {
    with_token(TestServer::anonymous().get(server.url("/api/admin/validate")), token)
        .send()
        .await
        .expect("Failed to validate")
        .status()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_then_validate() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;

    let response = with_token(
        TestServer::anonymous().get(server.url("/api/admin/validate")),
        &token,
    )
    .send()
    .await
    .expect("Failed to validate");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to read body");
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_wrong_password_sets_no_cookie() {
    let server = TestServer::spawn().await;
    let response = TestServer::anonymous()
        .post(server.url("/api/admin/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "nope" }))
        .send()
        .await
        .expect("Failed to send login");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn test_login_cookie_authorizes_browser() {
    let server = TestServer::spawn().await;
    let browser = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");
    server.login(&browser).await;

    let validated = browser
        .get(server.url("/api/admin/validate"))
        .send()
        .await
        .expect("Failed to validate");
    assert_eq!(validated.status(), StatusCode::OK);

    browser
        .post(server.url("/api/admin/logout"))
        .send()
        .await
        .expect("Failed to log out");
    let after = browser
        .get(server.url("/api/admin/validate"))
        .send()
        .await
        .expect("Failed to validate");
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Maintenance
// ============================================================================

#[tokio::test]
async fn test_maintenance_lockout_and_admin_bypass() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;
    let response = server.set_maintenance(&token, true).await;
    assert_eq!(response.status(), StatusCode::OK);

    let anonymous = TestServer::anonymous()
        .get(server.url("/blog"))
        .send()
        .await
        .expect("Failed to get blog");
    assert_eq!(anonymous.status(), StatusCode::SERVICE_UNAVAILABLE);

    let admin = with_token(TestServer::anonymous().get(server.url("/blog")), &token)
        .send()
        .await
        .expect("Failed to get blog");
    assert_eq!(admin.status(), StatusCode::OK);

    let reads = TestServer::anonymous()
        .get(server.url("/api/posts"))
        .send()
        .await
        .expect("Failed to get posts");
    assert_eq!(reads.status(), StatusCode::OK);

    server.set_maintenance(&token, false).await;
    let reopened = TestServer::anonymous()
        .get(server.url("/blog"))
        .send()
        .await
        .expect("Failed to get blog");
    assert_eq!(reopened.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_does_not_bypass_maintenance() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;
    server.set_maintenance(&token, true).await;

    server.clock.advance(chrono::Duration::hours(2));

    let response = with_token(TestServer::anonymous().get(server.url("/blog")), &token)
        .send()
        .await
        .expect("Failed to get blog");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Expiry, multiple tabs, logout
// ============================================================================

#[tokio::test]
async fn test_expired_session_stays_rejected() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;

    server.clock.advance(chrono::Duration::seconds(3601));

    assert_eq!(validate(&server, &token).await, StatusCode::UNAUTHORIZED);
    assert_eq!(validate(&server, &token).await, StatusCode::UNAUTHORIZED);
    let lookup = server
        .state
        .sessions()
        .lookup(&token)
        .await
        .expect("store reachable");
    assert!(lookup.is_none());
}

#[tokio::test]
async fn test_seeded_tab_survives_parent_logout() {
    let server = TestServer::spawn().await;
    let tab_a = server.login(&TestServer::anonymous()).await;

    let seeded: Value = with_token(
        TestServer::anonymous().post(server.url("/api/admin/sessions")),
        &tab_a,
    )
    .send()
    .await
    .expect("Failed to seed")
    .json()
    .await
    .expect("Failed to read seed body");
    let tab_b = folio_core::AdminToken::parse(seeded["admin_token"].as_str().expect("token"))
        .expect("well-formed token");
    assert_ne!(tab_a, tab_b);

    let logout = with_token(
        TestServer::anonymous().post(server.url("/api/admin/logout")),
        &tab_a,
    )
    .send()
    .await
    .expect("Failed to log out");
    assert_eq!(logout.status(), StatusCode::OK);

    assert_eq!(validate(&server, &tab_a).await, StatusCode::UNAUTHORIZED);
    assert_eq!(validate(&server, &tab_b).await, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_twice_and_without_token() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;

    for _ in 0..2 {
        let response = with_token(
            TestServer::anonymous().post(server.url("/api/admin/logout")),
            &token,
        )
        .send()
        .await
        .expect("Failed to log out");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let anonymous = TestServer::anonymous()
        .post(server.url("/api/admin/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(anonymous.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_settings_update_requires_live_session() {
    let server = TestServer::spawn().await;
    let token = server.login(&TestServer::anonymous()).await;
    let forged = folio_core::AdminToken::parse("0000forged").expect("well-formed token");

    let rejected = server.set_maintenance(&forged, true).await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let missing = TestServer::anonymous()
        .put(server.url("/api/settings"))
        .json(&json!({ "showBlog": false }))
        .send()
        .await
        .expect("Failed to update settings");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let accepted = with_token(TestServer::anonymous().put(server.url("/api/settings")), &token)
        .json(&json!({ "showBlog": false }))
        .send()
        .await
        .expect("Failed to update settings");
    assert_eq!(accepted.status(), StatusCode::OK);
    let settings: Value = accepted.json().await.expect("Failed to read settings");
    assert_eq!(settings["showBlog"], false);
    assert_eq!(settings["showProjects"], true);
    assert_eq!(settings["maintenanceMode"], false);
}
