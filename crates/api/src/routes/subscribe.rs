//! Email subscription proxy endpoint.
//!
//! Thin check-then-create forwarding to the newsletter provider. The
//! provider is the source of truth; this endpoint only validates the
//! address shape and maps provider outcomes onto our response
//! contract.

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use telemetry::metrics;
use tracing::info;
use validator::Validate;

use crate::response::{ApiError, SubscribeResponse};
use crate::state::{AppState, SubscribeError};

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
}

/// POST /subscribe - subscribe an email address.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubscribeResponse>, ApiError> {
    metrics().subscribe_requests.inc();

    let request: SubscribeRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::invalid_json("Invalid JSON payload"))?;

    if request.validate().is_err() {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }

    match state.subscriptions.subscribe(&request.email).await {
        Ok(data) => {
            info!("Subscription created");
            Ok(Json(SubscribeResponse {
                success: true,
                data,
            }))
        }
        Err(err) => {
            if matches!(err, SubscribeError::Conflict(_)) {
                metrics().subscribe_conflicts.inc();
            }
            Err(err.into())
        }
    }
}
