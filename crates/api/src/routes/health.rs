//! Health check endpoints.

use axum::{http::StatusCode, Json};
use chrono::Utc;

use gateway_core::SEVERITY_LEVELS;

use crate::response::HealthResponse;

/// GET /webhooks/error - reporting endpoint health and capabilities.
///
/// Always 200: the gateway has no external dependency whose loss
/// would stop admission.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        supported_severities: SEVERITY_LEVELS.iter().map(|s| s.to_string()).collect(),
    })
}

/// GET /health/live - liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
