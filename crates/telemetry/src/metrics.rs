//! In-process metrics for admission outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 2ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 1s
    buckets: [AtomicU64; 9],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 9] = [1, 2, 5, 10, 25, 50, 100, 250, 1000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[Self::BUCKET_BOUNDS.len() - 1].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }
}

/// Collected metrics for the webhook gateway.
#[derive(Debug, Default)]
pub struct Metrics {
    // Error-report path
    pub reports_received: Counter,
    pub reports_admitted: Counter,
    pub reports_rejected: Counter,
    pub rate_limited_requests: Counter,
    pub signature_failures: Counter,
    pub schema_failures: Counter,
    pub sink_errors: Counter,

    // Mobile-issue path
    pub mobile_reports_received: Counter,
    pub mobile_reports_admitted: Counter,

    // Subscription proxy
    pub subscribe_requests: Counter,
    pub subscribe_conflicts: Counter,

    // Latency
    pub admission_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            reports_received: self.reports_received.get(),
            reports_admitted: self.reports_admitted.get(),
            reports_rejected: self.reports_rejected.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            signature_failures: self.signature_failures.get(),
            schema_failures: self.schema_failures.get(),
            sink_errors: self.sink_errors.get(),
            mobile_reports_received: self.mobile_reports_received.get(),
            mobile_reports_admitted: self.mobile_reports_admitted.get(),
            subscribe_requests: self.subscribe_requests.get(),
            subscribe_conflicts: self.subscribe_conflicts.get(),
            admission_latency_mean_ms: self.admission_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub reports_received: u64,
    pub reports_admitted: u64,
    pub reports_rejected: u64,
    pub rate_limited_requests: u64,
    pub signature_failures: u64,
    pub schema_failures: u64,
    pub sink_errors: u64,
    pub mobile_reports_received: u64,
    pub mobile_reports_admitted: u64,
    pub subscribe_requests: u64,
    pub subscribe_conflicts: u64,
    pub admission_latency_mean_ms: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
