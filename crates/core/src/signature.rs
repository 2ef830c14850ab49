//! HMAC signature verification for inbound webhooks.
//!
//! Signatures are HMAC-SHA256 over the raw, unparsed body bytes,
//! hex-encoded in the `x-signature` header. Comparison is constant
//! time; a header of the wrong shape is rejected before any digest
//! work.

use std::sync::LazyLock;

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;

use crate::error::{ConfigErrorCode, Error, Result};
use crate::limits::SIGNATURE_PATTERN;

type HmacSha256 = Hmac<Sha256>;

/// Compiled signature shape regex (lazy initialization).
static SIGNATURE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SIGNATURE_PATTERN).expect("invalid signature pattern"));

/// Compute the hex signature a client sends for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key initialization failed");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded signature over the raw body bytes.
///
/// A header that is not exactly 64 hex characters is rejected
/// immediately; matching-shape signatures are compared in constant
/// time so a caller cannot learn the digest byte by byte.
pub fn verify(secret: &str, body: &[u8], provided: &str) -> bool {
    if !SIGNATURE_REGEX.is_match(provided) {
        return false;
    }
    let Ok(expected) = hex::decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    expected.len() == computed.len() && constant_time_eq(&computed, &expected)
}

/// How a webhook path treats the `x-signature` header.
///
/// Enforcement is controlled by an explicit configuration flag, never
/// by sniffing the secret's value. Disabled mode is for local
/// development only.
#[derive(Debug, Clone)]
pub enum SignaturePolicy {
    /// Verify HMAC-SHA256 over the raw body with this secret.
    Enforced { secret: String },
    /// Skip verification entirely.
    Disabled,
}

impl SignaturePolicy {
    /// Build a policy from configuration.
    ///
    /// Enforcing without a usable secret is a configuration error so
    /// the gateway fails at startup instead of rejecting every request.
    pub fn from_settings(secret: Option<String>, enforce: bool) -> Result<Self> {
        if !enforce {
            return Ok(Self::Disabled);
        }
        match secret {
            Some(secret) if !secret.is_empty() => Ok(Self::Enforced { secret }),
            _ => Err(Error::config(
                ConfigErrorCode::MissingSecret,
                "signature enforcement is enabled but no webhook secret is configured",
            )),
        }
    }

    /// Check whether this policy verifies signatures.
    pub fn is_enforced(&self) -> bool {
        matches!(self, Self::Enforced { .. })
    }
}
