//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Warm passes and content items
//! - Cache checks and magnet submissions against the debrid provider
//! - Stream discovery volume

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Passes and items
// =============================================================================

/// Completed passes by run mode.
pub static PASSES_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarmer_passes_completed_total", "Total warm passes run"),
        &["mode"], // "oneshot", "loop", "interval"
    )
    .unwrap()
});

/// Content items processed by kind and result.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachewarmer_items_processed_total",
            "Total content items processed",
        ),
        &["kind", "result"], // kind: "movie", "episode"; result: "ok", "failed"
    )
    .unwrap()
});

/// Time spent on one content item, excluding the inter-item delay.
pub static ITEM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cachewarmer_item_duration_seconds",
            "Duration of a single content item",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["kind"],
    )
    .unwrap()
});

/// Streams returned by discovery per item, before the cap.
pub static STREAMS_DISCOVERED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cachewarmer_streams_discovered",
            "Number of streams discovered per content item",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 200.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Debrid
// =============================================================================

/// Cache checks by outcome.
pub static CACHE_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarmer_cache_checks_total", "Total cache availability checks"),
        &["result"], // "cached", "not_cached", "unknown"
    )
    .unwrap()
});

/// Magnet submissions by candidate kind and result.
pub static SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarmer_submissions_total", "Total magnet submissions"),
        &["kind", "result"], // kind: "single", "pack"; result: "success", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PASSES_COMPLETED.clone()),
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(ITEM_DURATION.clone()),
        Box::new(STREAMS_DISCOVERED.clone()),
        Box::new(CACHE_CHECKS.clone()),
        Box::new(SUBMISSIONS.clone()),
    ]
}
