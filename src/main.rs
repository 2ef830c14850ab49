//! Webhook Report Gateway
//!
//! Inbound webhook admission pipeline handling:
//! - Client fingerprinting and per-client rate limiting
//! - Structural validation of error reports
//! - HMAC-SHA256 signature verification
//! - Severity-routed delivery to the logging sink

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use api::{router, AppState};
use api::state::{SubscriptionConfig, WebhookConfig};
use gateway_core::SignaturePolicy;
use report_sink::LogSink;
use telemetry::{init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    webhook: WebhookConfig,

    #[serde(default)]
    subscribe: SubscriptionConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook: WebhookConfig::default(),
            subscribe: SubscriptionConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting Webhook Report Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;

    let signature_policy = SignaturePolicy::from_settings(
        config.webhook.secret.clone(),
        config.webhook.enforce_signature,
    )
    .context("Invalid webhook signature configuration")?;

    if !signature_policy.is_enforced() {
        warn!("Signature verification is DISABLED for the error-report path; set webhook.enforce_signature in production");
    }
    if config.webhook.mobile_secret.is_none() {
        warn!("Mobile webhook secret is not configured; /webhooks/mobile-issue will reject all requests");
    }

    // Create application state
    let state = AppState::new(
        Arc::new(LogSink::new()),
        signature_policy,
        config.webhook.mobile_secret.clone(),
        config.webhook.rate_limit.clone(),
        config.subscribe.clone(),
    );

    // Start rate limiter cleanup background task
    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    // Create router
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Ok(snapshot) = serde_json::to_string(&metrics().snapshot()) {
        info!(metrics = %snapshot, "Final metrics snapshot");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("GATEWAY")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested webhook config from environment
    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(secret) = std::env::var("GATEWAY_WEBHOOK_SECRET") {
        config.webhook.secret = Some(secret);
    }
    if let Ok(v) = std::env::var("GATEWAY_WEBHOOK_ENFORCE_SIGNATURE") {
        config.webhook.enforce_signature = v == "1" || v.eq_ignore_ascii_case("true");
    }
    if let Ok(secret) = std::env::var("GATEWAY_WEBHOOK_MOBILE_SECRET") {
        config.webhook.mobile_secret = Some(secret);
    }
    if let Ok(window) = std::env::var("GATEWAY_WEBHOOK_RATE_LIMIT_WINDOW_MS") {
        if let Ok(window_ms) = window.parse() {
            config.webhook.rate_limit.window_ms = window_ms;
        }
    }
    if let Ok(ceiling) = std::env::var("GATEWAY_WEBHOOK_RATE_LIMIT_MAX_REQUESTS") {
        if let Ok(max_requests) = ceiling.parse() {
            config.webhook.rate_limit.max_requests = max_requests;
        }
    }

    // Manual overrides for nested subscription config
    if let Ok(base_url) = std::env::var("GATEWAY_SUBSCRIBE_BASE_URL") {
        config.subscribe.base_url = base_url;
    }
    if let Ok(api_key) = std::env::var("GATEWAY_SUBSCRIBE_API_KEY") {
        config.subscribe.api_key = Some(api_key);
    }
    if let Ok(publication_id) = std::env::var("GATEWAY_SUBSCRIBE_PUBLICATION_ID") {
        config.subscribe.publication_id = Some(publication_id);
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
