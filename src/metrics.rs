//! Metrics for the templating engine
//!
//! Prometheus counters tracking token resolution, ref id allocation and
//! interval computation. The host application exposes them through its own
//! `/metrics` endpoint by calling [`gather_metrics`].

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};

lazy_static! {
    /// Tokens seen during interpolation, by outcome
    pub static ref TOKENS_TOTAL: CounterVec = register_counter_vec!(
        "templating_tokens_total",
        "Template tokens processed during interpolation",
        &["outcome"]
    ).unwrap();

    /// Ref ids handed out by the allocator
    pub static ref REF_IDS_ALLOCATED: CounterVec = register_counter_vec!(
        "templating_ref_ids_allocated_total",
        "Ref ids allocated for new queries",
        &["width"]
    ).unwrap();

    /// Interval computations, by which bound decided the result
    pub static ref INTERVALS_TOTAL: CounterVec = register_counter_vec!(
        "templating_intervals_total",
        "Interval computations",
        &["source"]
    ).unwrap();

    /// Computed interval in seconds
    pub static ref INTERVAL_SECONDS: Histogram = register_histogram!(
        "templating_interval_seconds",
        "Computed query interval in seconds",
        vec![0.01, 0.1, 1.0, 15.0, 60.0, 300.0, 3600.0, 86400.0]
    ).unwrap();
}

/// Record the outcome of one token lookup
pub fn record_token(resolved: bool) {
    let outcome = if resolved { "resolved" } else { "unresolved" };
    TOKENS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record one allocated ref id by its width (without prefix)
pub fn record_ref_id(width: usize) {
    let width = match width {
        1 => "1",
        2 => "2",
        _ => "3+",
    };
    REF_IDS_ALLOCATED.with_label_values(&[width]).inc();
}

/// Record one interval computation
///
/// `source` is `default`, `computed` or `floor`.
pub fn record_interval(source: &str, interval_ms: i64) {
    INTERVALS_TOTAL.with_label_values(&[source]).inc();
    INTERVAL_SECONDS.observe(interval_ms as f64 / 1000.0);
}

/// Gather all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_token_increments() {
        let before = TOKENS_TOTAL.with_label_values(&["unresolved"]).get();
        record_token(false);
        let after = TOKENS_TOTAL.with_label_values(&["unresolved"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_gather_contains_registered_metrics() {
        record_interval("computed", 30_000);
        record_ref_id(2);
        let text = gather_metrics();
        assert!(text.contains("templating_intervals_total"));
        assert!(text.contains("templating_ref_ids_allocated_total"));
    }
}
