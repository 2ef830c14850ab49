//! Mobile-issue webhook endpoint.
//!
//! A stripped-down sibling of the error-report pipeline: the signature
//! check is mandatory and unconditional, then the payload is decoded
//! leniently and logged. Shares the constant-time comparison primitive
//! with the main path.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use telemetry::metrics;
use tracing::{error, warn};

use gateway_core::{
    error::{ConfigErrorCode, SignatureErrorCode, ValidationErrorCode},
    signature, Error, MobileIssueReport,
};

use crate::response::{ApiError, MobileAck};
use crate::state::AppState;

/// POST /webhooks/mobile-issue - mobile issue report.
pub async fn mobile_issue_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MobileAck>, ApiError> {
    metrics().mobile_reports_received.inc();

    // This path has no disabled mode; an unconfigured secret is a
    // server-side error, not a skip.
    let Some(secret) = state.mobile_secret.as_deref() else {
        error!("Mobile webhook secret is not configured");
        return Err(Error::config(
            ConfigErrorCode::MissingSecret,
            "missing mobile webhook secret",
        )
        .into());
    };

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
        warn!("Mobile issue signature verification failed");
        return Err(Error::signature(SignatureErrorCode::Invalid, "Invalid signature").into());
    }

    let issue: MobileIssueReport = match serde_json::from_slice(&body) {
        Ok(issue) => issue,
        Err(_) => {
            return Err(Error::validation(
                ValidationErrorCode::InvalidJson,
                "Invalid JSON payload",
            )
            .into())
        }
    };

    if let Err(e) = state.sink.deliver_mobile(&issue).await {
        metrics().sink_errors.inc();
        error!(error = %e, "Failed to deliver mobile issue to sink");
    }

    metrics().mobile_reports_admitted.inc();

    Ok(Json(MobileAck::reported()))
}
