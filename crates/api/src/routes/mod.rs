//! API routes.

pub mod health;
pub mod mobile;
pub mod report;
pub mod subscribe;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::response::ApiError;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/webhooks/error",
            post(report::report_handler).get(health::health_handler),
        )
        .route("/webhooks/mobile-issue", post(mobile::mobile_issue_handler))
        .route("/subscribe", post(subscribe::subscribe_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Last-resort mapping of a panicking handler to a structured 500.
///
/// Detail stays in the log; the caller sees only the generic body.
fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("Request handler panicked");
    ApiError::internal("Internal server error").into_response()
}
