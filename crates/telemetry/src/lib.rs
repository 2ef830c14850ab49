//! Tracing setup and in-process metrics for the webhook gateway.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
