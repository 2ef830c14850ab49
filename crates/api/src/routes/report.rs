//! Error-report admission endpoint.
//!
//! Stages run strictly in order, each a potential early exit:
//! fingerprinting, rate limiting, content-type check, JSON parse,
//! schema validation, signature verification (when enforced),
//! normalization, delivery. Every failure path maps to a structured
//! JSON response; nothing escapes the handler.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, info, warn};

use gateway_core::{
    error::{RateLimitErrorCode, SignatureErrorCode, ValidationErrorCode},
    limits::MAX_REPORT_SIZE_BYTES,
    signature, Error, ErrorReport, SignaturePolicy,
};

use crate::extractors::ClientFingerprint;
use crate::middleware::rate_limit::Decision;
use crate::response::{ApiError, ReportResponse};
use crate::state::AppState;

/// POST /webhooks/error - error report admission pipeline.
pub async fn report_handler(
    State(state): State<AppState>,
    ClientFingerprint(client_id): ClientFingerprint,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReportResponse>, ApiError> {
    let start = Instant::now();

    metrics().reports_received.inc();

    // Rate limiting, keyed by the derived fingerprint.
    if let Decision::Rejected { retry_after_secs } = state.rate_limiter.check(client_id.as_str()) {
        metrics().rate_limited_requests.inc();
        warn!(client_id = %client_id, "Rate limit exceeded");
        return Err(Error::rate_limit(
            RateLimitErrorCode::Exceeded,
            "Rate limit exceeded. Please try again later.",
            Some(retry_after_secs),
        )
        .into());
    }

    // Declared content type must be JSON; the body is not consumed
    // further otherwise.
    if !content_type_is_json(&headers) {
        metrics().reports_rejected.inc();
        return Err(Error::validation(
            ValidationErrorCode::ContentType,
            "Content-Type must be application/json",
        )
        .into());
    }

    // Size guard before parsing.
    if body.len() > MAX_REPORT_SIZE_BYTES {
        metrics().reports_rejected.inc();
        return Err(Error::validation(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_REPORT_SIZE_BYTES / 1024
            ),
        )
        .into());
    }

    // Parse.
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            metrics().reports_rejected.inc();
            debug!(client_id = %client_id, error = %e, "Rejected malformed JSON body");
            return Err(Error::validation(
                ValidationErrorCode::InvalidJson,
                "Invalid JSON payload",
            )
            .into());
        }
    };

    // Schema validation, collecting every violated field.
    let report = ErrorReport::from_value(&value).map_err(|violations| {
        metrics().schema_failures.inc();
        metrics().reports_rejected.inc();
        debug!(
            client_id = %client_id,
            violations = violations.len(),
            "Rejected report with schema violations"
        );
        ApiError::schema(&violations)
    })?;

    // Signature over the raw, unparsed body bytes.
    if let SignaturePolicy::Enforced { secret } = &state.signature_policy {
        let provided = headers
            .get("x-signature")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if provided.is_empty() {
            metrics().signature_failures.inc();
            return Err(Error::signature(SignatureErrorCode::Missing, "Missing signature").into());
        }
        if !signature::verify(secret, &body, provided) {
            metrics().signature_failures.inc();
            warn!(client_id = %client_id, "Signature verification failed");
            return Err(Error::signature(SignatureErrorCode::Invalid, "Invalid signature").into());
        }
    }

    // Normalize and deliver. Sink failure is logged and counted but
    // never fails an admitted request.
    let admitted = report.admit(&client_id, Utc::now());
    let report_id = admitted.report_id;
    let severity = admitted.severity;

    if let Err(e) = state.sink.deliver(&admitted).await {
        metrics().sink_errors.inc();
        error!(report_id = %report_id, error = %e, "Failed to deliver report to sink");
    }

    metrics().reports_admitted.inc();
    metrics()
        .admission_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    info!(
        report_id = %report_id,
        client_id = %client_id,
        severity = %severity,
        "Error report admitted"
    );

    Ok(Json(ReportResponse::admitted(report_id, severity)))
}

fn content_type_is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}
