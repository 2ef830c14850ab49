//! Error report types and structural validation.
//!
//! Reports arrive as loosely-typed JSON. The decoder produces either a
//! typed [`ErrorReport`] or a list of [`FieldViolation`]s covering
//! every violated field, so a rejected client sees all of its problems
//! at once instead of one per round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::fingerprint::ClientId;

/// Accepted severity literals, in escalation order.
pub const SEVERITY_LEVELS: [&str; 4] = ["low", "medium", "high", "critical"];

/// Report severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity literal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error being reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Where and how the error occurred.
///
/// Every field is optional; unknown or mistyped fields are dropped
/// rather than rejected, since context is advisory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// A validated inbound error report.
///
/// Any client-supplied `clientId` is discarded during decoding; the
/// server derives its own during admission.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: ErrorDetails,
    pub context: ReportContext,
    pub severity: Severity,
}

/// A single structural problem in a submitted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub expected: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: expected {}", self.field, self.expected)
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

impl ErrorReport {
    /// Decode a parsed JSON value, collecting every violated field.
    ///
    /// Requirements: `error.name` and `error.message` are strings,
    /// `context` is an object, `severity` is one of the four accepted
    /// literals. Optional context fields that are present but mistyped
    /// are silently dropped.
    pub fn from_value(value: &Value) -> std::result::Result<Self, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let Some(obj) = value.as_object() else {
            return Err(vec![FieldViolation::new("(payload)", "object")]);
        };

        let error = match obj.get("error").and_then(Value::as_object) {
            Some(err_obj) => {
                let name = err_obj.get("name").and_then(Value::as_str);
                if name.is_none() {
                    violations.push(FieldViolation::new("error.name", "string"));
                }
                let message = err_obj.get("message").and_then(Value::as_str);
                if message.is_none() {
                    violations.push(FieldViolation::new("error.message", "string"));
                }
                name.zip(message).map(|(name, message)| ErrorDetails {
                    name: name.to_string(),
                    message: message.to_string(),
                    stack: string_field(err_obj, "stack"),
                    code: string_field(err_obj, "code"),
                })
            }
            None => {
                violations.push(FieldViolation::new("error", "object"));
                None
            }
        };

        let context = match obj.get("context").and_then(Value::as_object) {
            Some(ctx_obj) => Some(ReportContext {
                url: string_field(ctx_obj, "url"),
                user_agent: string_field(ctx_obj, "userAgent"),
                timestamp: string_field(ctx_obj, "timestamp"),
                user_id: string_field(ctx_obj, "userId"),
                session_id: string_field(ctx_obj, "sessionId"),
                page: string_field(ctx_obj, "page"),
                component: string_field(ctx_obj, "component"),
                action: string_field(ctx_obj, "action"),
            }),
            None => {
                violations.push(FieldViolation::new("context", "object"));
                None
            }
        };

        let severity = match obj.get("severity").and_then(Value::as_str) {
            Some(s) => {
                let parsed = Severity::parse(s);
                if parsed.is_none() {
                    violations.push(FieldViolation::new(
                        "severity",
                        "one of: low | medium | high | critical",
                    ));
                }
                parsed
            }
            None => {
                violations.push(FieldViolation::new(
                    "severity",
                    "one of: low | medium | high | critical",
                ));
                None
            }
        };

        match (error, context, severity) {
            (Some(error), Some(context), Some(severity)) if violations.is_empty() => Ok(Self {
                error,
                context,
                severity,
            }),
            _ => Err(violations),
        }
    }

    /// The payload shape echoed back on schema violations.
    ///
    /// This self-describing rejection is part of the endpoint contract.
    pub fn expected_shape() -> Value {
        serde_json::json!({
            "error": {
                "name": "string",
                "message": "string",
                "stack": "string (optional)",
                "code": "string (optional)"
            },
            "context": {
                "url": "string (optional)",
                "userAgent": "string (optional)",
                "timestamp": "string (optional)",
                "userId": "string (optional)",
                "sessionId": "string (optional)",
                "page": "string (optional)",
                "component": "string (optional)",
                "action": "string (optional)"
            },
            "severity": "low | medium | high | critical"
        })
    }

    /// Normalize a validated report into its admitted form.
    ///
    /// The server-derived client id always wins over anything the
    /// client sent; a missing context timestamp defaults to receipt
    /// time. The result is immutable and consumed once by the sink.
    pub fn admit(self, client_id: &ClientId, received_at: DateTime<Utc>) -> AdmittedReport {
        let mut context = self.context;
        if context.timestamp.is_none() {
            context.timestamp = Some(received_at.to_rfc3339());
        }

        AdmittedReport {
            report_id: Uuid::new_v4(),
            client_id: client_id.as_str().to_string(),
            error: self.error,
            context,
            severity: self.severity,
            received_at,
        }
    }
}

/// A report that has passed every admission stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmittedReport {
    /// Fresh correlation id, returned to the caller.
    pub report_id: Uuid,
    /// Server-derived fingerprint.
    pub client_id: String,
    pub error: ErrorDetails,
    pub context: ReportContext,
    pub severity: Severity,
    pub received_at: DateTime<Utc>,
}

/// A mobile layout issue reported by the site's own detection hook.
///
/// Decoded leniently: the mobile path's contract is the signature
/// check, not payload shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileIssueReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
