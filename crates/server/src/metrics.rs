//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vid2audio server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Progress store contents and free conversion slots (collected dynamically)
//! - Core metrics from `vid2audio_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;
use vid2audio_core::Stage;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vid2audio_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 600.0, 1800.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vid2audio_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vid2audio_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Task Metrics (collected dynamically)
// =============================================================================

/// Progress records by stage.
pub static PROGRESS_RECORDS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "vid2audio_progress_records",
            "Tracked progress records by stage",
        ),
        &["stage"],
    )
    .unwrap()
});

/// Conversions that may start without waiting.
pub static CONVERSION_SLOTS_AVAILABLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vid2audio_conversion_slots_available",
        "Number of conversions that may start immediately",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Tasks
    registry
        .register(Box::new(PROGRESS_RECORDS.clone()))
        .unwrap();
    registry
        .register(Box::new(CONVERSION_SLOTS_AVAILABLE.clone()))
        .unwrap();

    // Core metrics (tools, pipeline, retention)
    for metric in vid2audio_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the live progress store and
/// pipeline.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let counts = state.progress().counts_by_stage().await;
    for stage in Stage::ALL {
        let count = counts.get(&stage).copied().unwrap_or(0);
        PROGRESS_RECORDS
            .with_label_values(&[stage.as_str()])
            .set(count as i64);
    }

    CONVERSION_SLOTS_AVAILABLE.set(state.pipeline().available_slots() as i64);
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace names and IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    // File names and task ids are unbounded
    if path.len() > "/download/".len() && path.starts_with("/download/") {
        return "/download/{filename}".to_string();
    }
    if path.len() > "/progress/".len() && path.starts_with("/progress/") {
        return "/progress/{task_id}".to_string();
    }

    let result = UUID_RE.replace_all(path, "{id}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}
