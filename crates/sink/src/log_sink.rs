//! Tracing-backed report sink.

use async_trait::async_trait;
use gateway_core::limits::{MAX_LOGGED_STACK_CHARS, MAX_LOGGED_USER_AGENT_CHARS};
use gateway_core::{AdmittedReport, MobileIssueReport, Result, Severity};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::ReportSink;

/// Sink that writes admitted reports to the process log.
///
/// Severity selects the log level: critical and high land at error,
/// medium at warn, low at info. Client-controlled fields are truncated
/// before they reach the log stream.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

/// Truncated view of a report, serialized into the log line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord<'a> {
    name: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a str>,
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

impl<'a> LogRecord<'a> {
    fn from_report(report: &'a AdmittedReport) -> Self {
        Self {
            name: &report.error.name,
            message: &report.error.message,
            code: report.error.code.as_deref(),
            stack: report
                .error
                .stack
                .as_deref()
                .map(|s| truncate_chars(s, MAX_LOGGED_STACK_CHARS)),
            url: report.context.url.as_deref(),
            user_agent: report
                .context
                .user_agent
                .as_deref()
                .map(|s| truncate_chars(s, MAX_LOGGED_USER_AGENT_CHARS)),
            user_id: report.context.user_id.as_deref(),
            session_id: report.context.session_id.as_deref(),
            page: report.context.page.as_deref(),
            component: report.context.component.as_deref(),
            action: report.context.action.as_deref(),
            timestamp: report.context.timestamp.as_deref(),
        }
    }
}

#[async_trait]
impl ReportSink for LogSink {
    async fn deliver(&self, report: &AdmittedReport) -> Result<()> {
        let record = serde_json::to_string(&LogRecord::from_report(report))?;

        match report.severity {
            Severity::Critical => error!(
                report_id = %report.report_id,
                client_id = %report.client_id,
                severity = %report.severity,
                report = %record,
                "Critical client error"
            ),
            Severity::High => error!(
                report_id = %report.report_id,
                client_id = %report.client_id,
                severity = %report.severity,
                report = %record,
                "High severity client error"
            ),
            Severity::Medium => warn!(
                report_id = %report.report_id,
                client_id = %report.client_id,
                severity = %report.severity,
                report = %record,
                "Medium severity client error"
            ),
            Severity::Low => info!(
                report_id = %report.report_id,
                client_id = %report.client_id,
                severity = %report.severity,
                report = %record,
                "Low severity client error"
            ),
        }

        Ok(())
    }

    async fn deliver_mobile(&self, issue: &MobileIssueReport) -> Result<()> {
        let record = serde_json::to_string(issue)?;
        warn!(issue = %record, "Mobile issue reported");
        Ok(())
    }
}
