//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gateway_core::{
    error::{RateLimitErrorCode, ValidationErrorCode},
    ErrorReport, FieldViolation, Severity,
};

/// Success response for an admitted error report.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    /// Fresh correlation id for this report.
    pub error_id: Uuid,
    pub severity: Severity,
}

impl ReportResponse {
    pub fn admitted(error_id: Uuid, severity: Severity) -> Self {
        Self {
            success: true,
            message: "Error reported successfully".to_string(),
            error_id,
            severity,
        }
    }
}

/// Acknowledgement for the mobile-issue path.
#[derive(Debug, Serialize, Deserialize)]
pub struct MobileAck {
    pub ok: bool,
    pub message: String,
}

impl MobileAck {
    pub fn reported() -> Self {
        Self {
            ok: true,
            message: "Mobile issue reported successfully".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub supported_severities: Vec<String>,
}

/// Success response for the subscription proxy.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Error response.
///
/// Every rejection carries an `error` field; schema violations also
/// echo the expected payload shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(rename = "requiredFields", skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
            required_fields: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_required_fields(mut self, shape: serde_json::Value) -> Self {
        self.required_fields = Some(shape);
        self
    }
}

/// API error type carrying status, body, and optional Retry-After.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::with_code(
            StatusCode::BAD_REQUEST,
            ValidationErrorCode::InvalidJson.code(),
            msg,
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(
            StatusCode::BAD_REQUEST,
            ValidationErrorCode::Schema.code(),
            msg,
        )
    }

    /// Schema rejection listing every violated field and echoing the
    /// expected payload shape.
    pub fn schema(violations: &[FieldViolation]) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new(
                "Invalid payload structure",
                ValidationErrorCode::Schema.code(),
            )
            .with_details(violations.iter().map(|v| v.to_string()).collect())
            .with_required_fields(ErrorReport::expected_shape()),
            retry_after: None,
        }
    }

    pub fn unauthorized(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, RateLimitErrorCode::Exceeded.code()),
            retry_after,
        }
    }

    pub fn conflict(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::CONFLICT, code, msg)
    }

    pub fn config(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INT_001", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        // Add Retry-After header for rate limit responses
        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<gateway_core::Error> for ApiError {
    fn from(err: gateway_core::Error) -> Self {
        use gateway_core::Error;

        match &err {
            Error::Validation { code, message, http_status } => {
                let status =
                    StatusCode::from_u16(*http_status).unwrap_or(StatusCode::BAD_REQUEST);
                ApiError::with_code(status, *code, message)
            }
            Error::Signature { code, message, .. } => ApiError::unauthorized(*code, message),
            Error::RateLimit { message, retry_after, .. } => {
                ApiError::rate_limited(message, *retry_after)
            }
            Error::Config { code, .. } => {
                // Configuration detail stays server-side.
                ApiError::config(*code, "Server configuration error")
            }
            Error::Serialization(_) => ApiError::invalid_json("Invalid JSON payload"),
            Error::Internal(_) => ApiError::internal("Internal server error"),
        }
    }
}
