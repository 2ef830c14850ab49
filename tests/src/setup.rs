//! Common test setup functions.

use std::sync::Arc;

use axum::Router;

use api::middleware::rate_limit::{
    FixedWindowLimiter, InMemoryStore, RateLimitConfig, SharedRateLimiter,
};
use api::state::SubscriptionConfig;
use api::{router, AppState};
use gateway_core::SignaturePolicy;
use report_sink::ReportSink;

use crate::fixtures::{TEST_MOBILE_SECRET, TEST_SECRET};
use crate::mocks::{ManualClock, MockSink};

/// Arbitrary fixed epoch for the manual clock.
const CLOCK_START_MS: i64 = 1_700_000_000_000;

/// Test context exercising the real router with a mock sink and a
/// manual clock.
pub struct TestContext {
    pub sink: Arc<MockSink>,
    pub clock: Arc<ManualClock>,
    pub router: Router,
}

impl TestContext {
    /// Default context: signature verification disabled, mobile secret
    /// configured, mock subscription provider.
    pub fn new() -> Self {
        Self::build(
            SignaturePolicy::Disabled,
            Some(TEST_MOBILE_SECRET.to_string()),
            RateLimitConfig::default(),
        )
    }

    /// Context with signature enforcement on the error-report path.
    pub fn with_signature() -> Self {
        Self::build(
            SignaturePolicy::Enforced {
                secret: TEST_SECRET.to_string(),
            },
            Some(TEST_MOBILE_SECRET.to_string()),
            RateLimitConfig::default(),
        )
    }

    /// Context with a custom rate-limit configuration.
    pub fn with_rate_limit(config: RateLimitConfig) -> Self {
        Self::build(
            SignaturePolicy::Disabled,
            Some(TEST_MOBILE_SECRET.to_string()),
            config,
        )
    }

    /// Context without a mobile secret, for configuration-error tests.
    pub fn without_mobile_secret() -> Self {
        Self::build(SignaturePolicy::Disabled, None, RateLimitConfig::default())
    }

    fn build(
        policy: SignaturePolicy,
        mobile_secret: Option<String>,
        rate_config: RateLimitConfig,
    ) -> Self {
        let sink = Arc::new(MockSink::new());
        let clock = Arc::new(ManualClock::new(CLOCK_START_MS));

        let rate_limiter: SharedRateLimiter = Arc::new(FixedWindowLimiter::with_parts(
            rate_config,
            Box::new(InMemoryStore::new()),
            clock.clone(),
        ));

        let state = AppState::with_rate_limiter(
            sink.clone() as Arc<dyn ReportSink>,
            policy,
            mobile_secret,
            rate_limiter,
            SubscriptionConfig {
                base_url: "mock".to_string(),
                api_key: None,
                publication_id: None,
            },
        );

        Self {
            sink,
            clock,
            router: router(state),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
