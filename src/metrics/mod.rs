//! Metrics module
//!
//! Prometheus counters and histograms for upload outcomes.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "uploadr_uploads_total",
        "Total number of processed upload entries",
        &["field", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "uploadr_upload_bytes_total",
        "Total bytes stored"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "uploadr_upload_duration_seconds",
        "Per-entry processing duration in seconds",
        &["field"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    pub static ref REJECTIONS_TOTAL: CounterVec = register_counter_vec!(
        "uploadr_rejections_total",
        "Entries not stored, by reason",
        &["reason"]
    ).unwrap();
}

/// Record a stored upload
pub fn record_upload_success(field: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[field, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record an entry that was rejected or aborted
pub fn record_upload_failure(field: &str, reason: &str) {
    UPLOADS_TOTAL.with_label_values(&[field, "failure"]).inc();
    REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

/// Record per-entry processing time
pub fn record_upload_duration(field: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[field])
        .observe(duration_secs);
}

/// Text exposition of every registered metric
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upload_success() {
        let before = UPLOADS_TOTAL.with_label_values(&["metrics-ok", "success"]).get();
        record_upload_success("metrics-ok", 1024);
        let after = UPLOADS_TOTAL.with_label_values(&["metrics-ok", "success"]).get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_record_upload_failure() {
        let before = REJECTIONS_TOTAL.with_label_values(&["too_big"]).get();
        record_upload_failure("metrics-fail", "too_big");
        assert!(REJECTIONS_TOTAL.with_label_values(&["too_big"]).get() >= before + 1.0);
    }

    #[test]
    fn test_record_upload_duration() {
        record_upload_duration("metrics-duration", 0.002);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_render_contains_upload_metrics() {
        record_upload_success("metrics-render", 1);
        let text = render();
        assert!(text.contains("uploadr_uploads_total"));
        assert!(text.contains("metrics-render"));
    }
}
