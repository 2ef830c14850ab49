//! Delivery sink for admitted webhook reports.

pub mod log_sink;

pub use log_sink::LogSink;

use async_trait::async_trait;
use gateway_core::{AdmittedReport, MobileIssueReport, Result};

/// Destination for reports that pass admission.
///
/// Production uses the tracing-backed [`LogSink`]; tests substitute a
/// capturing mock. Downstream alerting and ticketing hang off whatever
/// consumes the sink's output; the gateway's contract ends at
/// reliable, structured delivery here.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver an admitted error report.
    async fn deliver(&self, report: &AdmittedReport) -> Result<()>;

    /// Deliver a mobile layout issue.
    async fn deliver_mobile(&self, issue: &MobileIssueReport) -> Result<()>;
}
