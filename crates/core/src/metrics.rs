//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Encoding (per-rendition jobs, durations)
//! - Publishing (store calls, durations)
//! - Request outcomes and cleanup

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Encoding
// =============================================================================

/// Encode jobs finished, by rendition and result.
pub static ENCODE_JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidladder_encode_jobs_total", "Total rendition encode jobs"),
        &["rendition", "result"], // "success", "failed"
    )
    .unwrap()
});

/// Encode duration in seconds.
pub static ENCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidladder_encode_duration_seconds",
            "Duration of one rendition encode",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["rendition"],
    )
    .unwrap()
});

// =============================================================================
// Publishing
// =============================================================================

/// Store calls, by result.
pub static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidladder_publish_total", "Total content store calls"),
        &["store", "result"],
    )
    .unwrap()
});

/// Store call duration in seconds.
pub static PUBLISH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidladder_publish_duration_seconds",
            "Duration of one content store call",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["store"],
    )
    .unwrap()
});

// =============================================================================
// Requests
// =============================================================================

/// Transcode requests by outcome.
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidladder_requests_total", "Total transcode requests"),
        &["outcome"], // "success", "probe_failed", "encode_failed", "publish_failed", "workspace_failed"
    )
    .unwrap()
});

/// Renditions selected per request.
pub static LADDER_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("vidladder_ladder_size", "Renditions selected per request")
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0]),
    )
    .unwrap()
});

/// Failed deletions of uploaded originals.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidladder_cleanup_failures_total",
        "Uploaded originals that could not be deleted",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Encoding
        Box::new(ENCODE_JOBS_TOTAL.clone()),
        Box::new(ENCODE_DURATION.clone()),
        // Publishing
        Box::new(PUBLISH_TOTAL.clone()),
        Box::new(PUBLISH_DURATION.clone()),
        // Requests
        Box::new(REQUESTS_TOTAL.clone()),
        Box::new(LADDER_SIZE.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        ENCODE_JOBS_TOTAL.with_label_values(&["720p", "success"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "vidladder_encode_jobs_total"));
    }
}
