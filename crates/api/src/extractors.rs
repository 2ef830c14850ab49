//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use gateway_core::ClientId;

/// Derived rate-limit bucket key for the calling client.
///
/// Computed before any other admission stage so rejected requests are
/// attributable too.
#[derive(Debug, Clone)]
pub struct ClientFingerprint(pub ClientId);

#[async_trait]
impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_ip(&parts.headers);
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok());

        Ok(Self(ClientId::derive(ip.as_deref(), user_agent)))
    }
}

/// Resolve the client IP from proxy headers.
///
/// `X-Forwarded-For` wins (first hop in the chain), then `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("X-Forwarded-For") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(ip) = xff_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP") {
        if let Ok(ip) = real_ip.to_str() {
            return Some(ip.to_string());
        }
    }

    None
}
