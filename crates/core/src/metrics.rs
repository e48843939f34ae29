//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - External tool invocations (downloader, transcoder)
//! - Conversion pipeline outcomes
//! - Retention sweeps

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// External Tools
// =============================================================================

/// Tool invocations by tool and result.
pub static TOOL_INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vid2audio_tool_invocations_total",
            "Total external tool invocations",
        ),
        &["tool", "result"], // "success", "failed", "timeout", "spawn_failed"
    )
    .unwrap()
});

/// Tool run duration in seconds.
pub static TOOL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vid2audio_tool_duration_seconds",
            "Duration of external tool runs",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 900.0, 1800.0]),
        &["tool"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline
// =============================================================================

/// Conversions by terminal result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vid2audio_conversions_total", "Total conversions by result"),
        &["result"],
    )
    .unwrap()
});

/// End-to-end conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vid2audio_conversion_duration_seconds",
            "Duration of whole conversions",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Retention
// =============================================================================

/// Progress records evicted by the sweeper.
pub static PROGRESS_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vid2audio_progress_evictions_total",
        "Finished progress records evicted",
    )
    .unwrap()
});

/// Workspace files evicted by the sweeper.
pub static FILE_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vid2audio_file_evictions_total",
        "Published workspace files evicted",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tools
        Box::new(TOOL_INVOCATIONS.clone()),
        Box::new(TOOL_DURATION.clone()),
        // Pipeline
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Retention
        Box::new(PROGRESS_EVICTIONS.clone()),
        Box::new(FILE_EVICTIONS.clone()),
    ]
}
