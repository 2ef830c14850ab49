//! Admission limits for the webhook gateway.
//!
//! These limits bound per-client request rates and the amount of
//! client-supplied data that reaches the log sink.
//!
//! # Usage Note
//!
//! `RATE_LIMIT_WINDOW_MS` and `RATE_LIMIT_CEILING` are the compiled-in
//! defaults; deployments override them through the rate-limit section
//! of the gateway configuration.

// === Rate Limiting ===

/// Fixed rate-limit window in milliseconds (1 minute).
pub const RATE_LIMIT_WINDOW_MS: i64 = 60_000;

/// Requests admitted per client within one window.
///
/// Moderate ceiling for error reporting: a healthy client sends a
/// handful of reports, a crash loop sends hundreds.
pub const RATE_LIMIT_CEILING: u32 = 30;

// === Payload Limits ===

/// Maximum accepted report body size in bytes (64KB).
///
/// Error payloads with full stack traces stay well under this.
pub const MAX_REPORT_SIZE_BYTES: usize = 64 * 1024;

// === Fingerprint ===

/// Hex characters kept from the fingerprint digest.
pub const CLIENT_ID_LEN: usize = 16;

// === Signature ===

/// Shape of a hex-encoded HMAC-SHA256 signature header.
pub const SIGNATURE_PATTERN: &str = r"^[0-9a-fA-F]{64}$";

// === Log Truncation ===

/// Stack trace characters kept in log output.
pub const MAX_LOGGED_STACK_CHARS: usize = 1000;

/// User-agent characters kept in log output.
pub const MAX_LOGGED_USER_AGENT_CHARS: usize = 200;
