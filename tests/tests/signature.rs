//! Tests for signature verification on both webhook paths.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

/// A correctly signed report is admitted when enforcement is on.
#[tokio::test]
async fn test_valid_signature_admitted() {
    let ctx = TestContext::with_signature();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::minimal_report();
    let signature = fixtures::sign(fixtures::TEST_SECRET, &payload);

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status_ok();
    assert_eq!(ctx.sink.report_count(), 1);
}

/// The signature covers the raw body: signing one payload and sending
/// another is rejected.
#[tokio::test]
async fn test_signature_over_different_body_rejected() {
    let ctx = TestContext::with_signature();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let signed_payload = fixtures::minimal_report();
    let signature = fixtures::sign(fixtures::TEST_SECRET, &signed_payload);

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(fixtures::full_report().into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_002");
    assert_eq!(ctx.sink.report_count(), 0);
}

/// A tampered signature header is rejected.
#[tokio::test]
async fn test_tampered_signature_rejected() {
    let ctx = TestContext::with_signature();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::minimal_report();
    let mut signature = fixtures::sign(fixtures::TEST_SECRET, &payload);
    // Flip the last hex character.
    let last = signature.pop().unwrap();
    signature.push(if last == '0' { '1' } else { '0' });

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// A header of the wrong length is rejected outright.
#[tokio::test]
async fn test_wrong_length_signature_rejected() {
    let ctx = TestContext::with_signature();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::minimal_report();

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .add_header("x-signature", "deadbeef")
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_002");
}

/// A missing header is rejected with its own code.
#[tokio::test]
async fn test_missing_signature_rejected() {
    let ctx = TestContext::with_signature();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(fixtures::minimal_report().into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_001");
}

/// With the policy disabled, unsigned reports are admitted.
#[tokio::test]
async fn test_disabled_policy_skips_verification() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(fixtures::minimal_report().into())
        .await;

    response.assert_status_ok();
}

/// The mobile path admits a correctly signed issue.
#[tokio::test]
async fn test_mobile_valid_signature_admitted() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::mobile_issue();
    let signature = fixtures::sign(fixtures::TEST_MOBILE_SECRET, &payload);

    let response = server
        .post("/webhooks/mobile-issue")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);

    let issues = ctx.sink.captured_mobile_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].page.as_deref(), Some("/pricing"));
}

/// The mobile path has no skip mode: a missing signature is rejected
/// even though the error-report path in this context is unsigned.
#[tokio::test]
async fn test_mobile_missing_signature_rejected() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/mobile-issue")
        .content_type("application/json")
        .bytes(fixtures::mobile_issue().into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_001");
}

/// A wrong mobile signature is rejected.
#[tokio::test]
async fn test_mobile_wrong_signature_rejected() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::mobile_issue();
    // Signed with the wrong secret.
    let signature = fixtures::sign(fixtures::TEST_SECRET, &payload);

    let response = server
        .post("/webhooks/mobile-issue")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_002");
}

/// An unconfigured mobile secret is a server error, not a skip.
#[tokio::test]
async fn test_mobile_unconfigured_secret_returns_500() {
    let ctx = TestContext::without_mobile_secret();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::mobile_issue();
    let signature = fixtures::sign(fixtures::TEST_MOBILE_SECRET, &payload);

    let response = server
        .post("/webhooks/mobile-issue")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "CFG_001");
    assert_eq!(body["error"], "Server configuration error");
}

/// Valid signature over malformed JSON: signature passes, decode
/// fails with 400.
#[tokio::test]
async fn test_mobile_malformed_json_after_valid_signature() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = "not json at all";
    let signature = fixtures::sign(fixtures::TEST_MOBILE_SECRET, payload);

    let response = server
        .post("/webhooks/mobile-issue")
        .content_type("application/json")
        .add_header("x-signature", &signature)
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}
