//! Unified error types for the webhook gateway.
//!
//! Error codes:
//! - VALID_001-004: Request validation errors
//! - AUTH_001-002: Signature verification errors
//! - RATE_001: Rate limit errors
//! - CFG_001-002: Server configuration errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Content-Type is not application/json
    ContentType,
    /// VALID_002: Body is not valid JSON
    InvalidJson,
    /// VALID_003: Payload violates the report schema
    Schema,
    /// VALID_004: Body exceeds the size limit
    PayloadTooLarge,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentType => "VALID_001",
            Self::InvalidJson => "VALID_002",
            Self::Schema => "VALID_003",
            Self::PayloadTooLarge => "VALID_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Signature verification error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureErrorCode {
    /// AUTH_001: x-signature header is required
    Missing,
    /// AUTH_002: Signature does not match the body
    Invalid,
}

impl SignatureErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "AUTH_001",
            Self::Invalid => "AUTH_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        401
    }
}

/// Rate limit error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitErrorCode {
    /// RATE_001: Rate limit exceeded
    Exceeded,
}

impl RateLimitErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exceeded => "RATE_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        429
    }
}

/// Configuration error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// CFG_001: A webhook secret is required but not configured
    MissingSecret,
    /// CFG_002: Subscription provider credentials are not configured
    MissingProviderCredentials,
}

impl ConfigErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSecret => "CFG_001",
            Self::MissingProviderCredentials => "CFG_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Unified error type for the webhook gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Signature verification error with code.
    #[error("[{code}] {message}")]
    Signature {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Rate limit error with code.
    #[error("[{code}] {message}")]
    RateLimit {
        code: &'static str,
        message: String,
        http_status: u16,
        retry_after: Option<u64>,
    },

    /// Server configuration error with code.
    #[error("[{code}] {message}")]
    Config {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a signature verification error.
    pub fn signature(code: SignatureErrorCode, msg: impl Into<String>) -> Self {
        Self::Signature {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a rate limit error.
    pub fn rate_limit(
        code: RateLimitErrorCode,
        msg: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::RateLimit {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retry_after,
        }
    }

    /// Create a configuration error.
    pub fn config(code: ConfigErrorCode, msg: impl Into<String>) -> Self {
        Self::Config {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { http_status, .. } => *http_status,
            Self::Signature { http_status, .. } => *http_status,
            Self::RateLimit { http_status, .. } => *http_status,
            Self::Config { http_status, .. } => *http_status,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation { code, .. } => Some(code),
            Self::Signature { code, .. } => Some(code),
            Self::RateLimit { code, .. } => Some(code),
            Self::Config { code, .. } => Some(code),
            _ => None,
        }
    }
}
