//! Tests for the error-report admission pipeline.
//!
//! These run the real router with a mock sink, covering the success
//! path, every 400-class rejection, and the sink-failure guarantee.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

/// Minimal valid payload is admitted with a fresh correlation id.
#[tokio::test]
async fn test_minimal_report_admitted() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(fixtures::minimal_report().into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["severity"], "low");
    assert!(
        uuid::Uuid::parse_str(body["errorId"].as_str().unwrap()).is_ok(),
        "errorId must be a UUID"
    );

    assert_eq!(ctx.sink.report_count(), 1);
}

/// The sink receives the normalized report: server-derived client id
/// and a defaulted timestamp.
#[tokio::test]
async fn test_normalization_overwrites_client_fields() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    // Payload tries to smuggle its own clientId.
    let payload = r#"{
        "error": {"name": "X", "message": "Y"},
        "context": {},
        "severity": "medium",
        "clientId": "spoofed-client-id"
    }"#;

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .add_header("X-Forwarded-For", "203.0.113.9")
        .add_header("User-Agent", "test-agent")
        .bytes(payload.into())
        .await;

    response.assert_status_ok();

    let captured = ctx.sink.captured_reports();
    assert_eq!(captured.len(), 1);
    let report = &captured[0];

    assert_ne!(report.client_id, "spoofed-client-id");
    assert_eq!(report.client_id.len(), 16);
    assert!(
        report.context.timestamp.is_some(),
        "timestamp must default to receipt time"
    );
}

/// A client-supplied context timestamp survives normalization.
#[tokio::test]
async fn test_client_timestamp_preserved() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = r#"{
        "error": {"name": "X", "message": "Y"},
        "context": {"timestamp": "2026-01-01T00:00:00Z"},
        "severity": "low"
    }"#;

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(payload.into())
        .await;

    response.assert_status_ok();
    let captured = ctx.sink.captured_reports();
    assert_eq!(
        captured[0].context.timestamp.as_deref(),
        Some("2026-01-01T00:00:00Z")
    );
}

/// Missing error.message is a schema violation that names the field
/// and echoes the expected shape.
#[tokio::test]
async fn test_missing_message_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = r#"{"error": {"name": "X"}, "context": {}, "severity": "low"}"#;

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
    assert!(body["error"].is_string());
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d.as_str().unwrap().contains("error.message")));
    assert_eq!(body["requiredFields"]["error"]["message"], "string");
}

/// Severity outside the allowed set is rejected.
#[tokio::test]
async fn test_unknown_severity_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(fixtures::report_with_severity("urgent").into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
    assert_eq!(ctx.sink.report_count(), 0);
}

/// Malformed JSON is a 400 with an error field, never a 500.
#[tokio::test]
async fn test_malformed_json_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(r#"{"error": {"name": "#.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
    assert!(body["error"].is_string());
}

/// A non-JSON content type is rejected before the body is parsed.
#[tokio::test]
async fn test_wrong_content_type_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/webhooks/error")
        .content_type("text/plain")
        .bytes(fixtures::minimal_report().into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// An oversized body is rejected without parsing.
#[tokio::test]
async fn test_oversized_body_returns_400() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let padding = "x".repeat(70 * 1024);
    let payload = format!(
        r#"{{"error": {{"name": "X", "message": "{}"}}, "context": {{}}, "severity": "low"}}"#,
        padding
    );

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(payload.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_004");
}

/// Repeated identical calls always succeed and yield distinct
/// correlation ids; the endpoint is not idempotent by design.
#[tokio::test]
async fn test_repeated_calls_yield_distinct_error_ids() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let mut ids = Vec::new();
    for _ in 0..3 {
        let response = server
            .post("/webhooks/error")
            .content_type("application/json")
            .bytes(fixtures::full_report().into())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        ids.push(body["errorId"].as_str().unwrap().to_string());
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3, "each admission gets a fresh errorId");
}

/// A failing sink never fails an admitted request.
#[tokio::test]
async fn test_sink_failure_still_returns_200() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    ctx.sink.set_should_fail(true);

    let response = server
        .post("/webhooks/error")
        .content_type("application/json")
        .bytes(fixtures::minimal_report().into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
}
