//! Client fingerprinting for rate-limit bucketing.
//!
//! The fingerprint is a one-way hash over the caller's IP-ish identity
//! and user agent. It is a rate-limit bucket key, not an authentication
//! credential: it only needs to be deterministic and non-reversible.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::limits::CLIENT_ID_LEN;

/// Derived, non-reversible per-client key.
///
/// Same `(ip, user_agent)` inputs always yield the same id; either
/// component differing yields a different id (hash determinism, not
/// collision-freedom).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Derive a client id from the resolved IP and user agent.
    ///
    /// Missing components fall back to the literal `"unknown"`, so
    /// clients behind strippers of either header still land in a
    /// (shared) bucket instead of bypassing rate limiting.
    pub fn derive(ip: Option<&str>, user_agent: Option<&str>) -> Self {
        let ip = ip.unwrap_or("unknown");
        let user_agent = user_agent.unwrap_or("unknown");

        let digest = Sha256::digest(format!("{}-{}", ip, user_agent).as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(CLIENT_ID_LEN);

        Self(hex)
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
