//! Tests for the email subscription proxy.
//!
//! The test context runs the subscription client in mock mode, which
//! tracks subscribed addresses in its cache.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::setup::TestContext;

/// A valid address subscribes successfully.
#[tokio::test]
async fn test_valid_email_subscribes() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/subscribe")
        .content_type("application/json")
        .bytes(r#"{"email": "reader@example.com"}"#.into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
}

/// Subscribing the same address twice is a conflict.
#[tokio::test]
async fn test_duplicate_subscription_returns_409() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server
        .post("/subscribe")
        .content_type("application/json")
        .bytes(r#"{"email": "reader@example.com"}"#.into())
        .await
        .assert_status_ok();

    let response = server
        .post("/subscribe")
        .content_type("application/json")
        .bytes(r#"{"email": "reader@example.com"}"#.into())
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("already subscribed"));
}

/// An address without a plausible email shape is rejected.
#[tokio::test]
async fn test_invalid_email_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/subscribe")
        .content_type("application/json")
        .bytes(r#"{"email": "not-an-email"}"#.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].is_string());
}

/// A malformed body is a 400, not a 500.
#[tokio::test]
async fn test_malformed_body_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/subscribe")
        .content_type("application/json")
        .bytes(r#"{"email": "#.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}
