//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use gateway_core::SignaturePolicy;
use report_sink::ReportSink;

use crate::middleware::rate_limit::{
    FixedWindowLimiter, RateLimitConfig, SharedRateLimiter, CLEANUP_INTERVAL,
};
use crate::response::ApiError;

/// Cache TTL for subscription-status checks (30 seconds).
const SUBSCRIPTION_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cache entries.
const SUBSCRIPTION_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Webhook path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// HMAC secret for the error-report path
    pub secret: Option<String>,
    /// When true, `x-signature` is required and verified on the
    /// error-report path. Leave false only in local development.
    #[serde(default)]
    pub enforce_signature: bool,
    /// HMAC secret for the mobile-issue path (always enforced)
    pub mobile_secret: Option<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Subscription provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Provider API base URL. Empty or `"mock"` enables mock mode.
    #[serde(default)]
    pub base_url: String,
    pub api_key: Option<String>,
    pub publication_id: Option<String>,
}

/// Failures of the subscription proxy.
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// The address already has a subscription.
    #[error("already subscribed: {0}")]
    Conflict(String),

    /// The provider rejected the request; its status is passed through.
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Provider credentials are not configured.
    #[error("subscription provider is not configured")]
    Config,

    #[error("provider unreachable: {0}")]
    Network(String),
}

impl From<SubscribeError> for ApiError {
    fn from(err: SubscribeError) -> Self {
        match err {
            SubscribeError::Conflict(msg) => ApiError::conflict("SUB_001", msg),
            SubscribeError::Provider { status, message } => {
                // Provider status passes through.
                let status = axum::http::StatusCode::from_u16(status)
                    .unwrap_or(axum::http::StatusCode::BAD_GATEWAY);
                ApiError::with_code(status, "SUB_002", message)
            }
            SubscribeError::Config => ApiError::config(
                gateway_core::error::ConfigErrorCode::MissingProviderCredentials.code(),
                "Server configuration error",
            ),
            SubscribeError::Network(_) => {
                ApiError::internal("Network error. Please check your connection and try again.")
            }
        }
    }
}

/// Newsletter provider client.
///
/// Performs check-then-create subscription calls and caches positive
/// "already subscribed" lookups for a short TTL to reduce provider
/// load. Mock mode keeps everything in the cache for tests.
#[derive(Clone)]
pub struct SubscriptionClient {
    config: SubscriptionConfig,
    http_client: reqwest::Client,
    /// email (lowercased) -> known subscribed
    cache: Cache<String, bool>,
    mock_mode: bool,
}

impl SubscriptionClient {
    /// Creates a new subscription client.
    pub fn new(config: SubscriptionConfig) -> Self {
        let mock_mode = config.base_url.is_empty() || config.base_url == "mock";

        Self {
            config,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to create HTTP client"),
            cache: Cache::builder()
                .max_capacity(SUBSCRIPTION_CACHE_MAX_CAPACITY)
                .time_to_live(SUBSCRIPTION_CACHE_TTL)
                .build(),
            mock_mode,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), SubscribeError> {
        match (
            self.config.api_key.as_deref(),
            self.config.publication_id.as_deref(),
        ) {
            (Some(key), Some(publication)) => Ok((key, publication)),
            _ => {
                error!("Missing subscription provider credentials");
                Err(SubscribeError::Config)
            }
        }
    }

    /// Check whether the address already has a subscription.
    ///
    /// A failed check is treated as "not subscribed" so the create
    /// attempt still runs; the provider is the authority either way.
    async fn is_subscribed(&self, email: &str) -> bool {
        let key = email.to_lowercase();

        if let Some(known) = self.cache.get(&key).await {
            debug!("Subscription cache hit");
            return known;
        }

        if self.mock_mode {
            return false;
        }

        let Ok((api_key, publication)) = self.credentials() else {
            return false;
        };

        let encoded: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
        let url = format!(
            "{}/publications/{}/subscriptions/by_email/{}",
            self.config.base_url, publication, encoded
        );

        match self.http_client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) if response.status().is_success() => {
                self.cache.insert(key, true).await;
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!(error = %e, "Subscription check failed, proceeding with create");
                false
            }
        }
    }

    /// Subscribe an address, treating an existing subscription as a
    /// conflict.
    pub async fn subscribe(
        &self,
        email: &str,
    ) -> Result<Option<serde_json::Value>, SubscribeError> {
        if self.is_subscribed(email).await {
            return Err(SubscribeError::Conflict(
                "You're already subscribed! Thank you for being part of the community.".into(),
            ));
        }

        let key = email.to_lowercase();

        if self.mock_mode {
            debug!("Using mock subscription provider");
            self.cache.insert(key, true).await;
            return Ok(None);
        }

        let (api_key, publication) = self.credentials()?;
        let url = format!(
            "{}/publications/{}/subscriptions",
            self.config.base_url, publication
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "email": email,
                "reactivate_existing": false,
                "send_welcome_email": false,
            }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Subscription request failed");
                SubscribeError::Network(e.to_string())
            })?;

        if response.status().is_success() {
            let data = response.json().await.ok();
            self.cache.insert(key, true).await;
            return Ok(data);
        }

        let status = response.status().as_u16();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Subscription failed. Please try again.".to_string());

        warn!(status = status, "Subscription provider returned error");
        Err(SubscribeError::Provider { status, message })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Admitted reports go here (LogSink in production, mock in tests)
    pub sink: Arc<dyn ReportSink>,
    /// Per-client limiter for the error-report path
    pub rate_limiter: SharedRateLimiter,
    /// Signature policy for the error-report path
    pub signature_policy: SignaturePolicy,
    /// Secret for the mobile-issue path; its check is unconditional
    pub mobile_secret: Option<String>,
    /// Newsletter provider client
    pub subscriptions: SubscriptionClient,
}

impl AppState {
    pub fn new(
        sink: Arc<dyn ReportSink>,
        signature_policy: SignaturePolicy,
        mobile_secret: Option<String>,
        rate_config: RateLimitConfig,
        subscription_config: SubscriptionConfig,
    ) -> Self {
        Self {
            sink,
            rate_limiter: Arc::new(FixedWindowLimiter::new(rate_config)),
            signature_policy,
            mobile_secret,
            subscriptions: SubscriptionClient::new(subscription_config),
        }
    }

    /// Create with an injected rate limiter (tests supply a manual
    /// clock and fresh store).
    pub fn with_rate_limiter(
        sink: Arc<dyn ReportSink>,
        signature_policy: SignaturePolicy,
        mobile_secret: Option<String>,
        rate_limiter: SharedRateLimiter,
        subscription_config: SubscriptionConfig,
    ) -> Self {
        Self {
            sink,
            rate_limiter,
            signature_policy,
            mobile_secret,
            subscriptions: SubscriptionClient::new(subscription_config),
        }
    }

    /// Start the rate limiter cleanup background task.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                rate_limiter.cleanup_stale();
            }
        })
    }
}
