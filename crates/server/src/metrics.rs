//! Prometheus metrics for observability.
//!
//! HTTP request metrics are recorded by middleware. Warmer and dedup store
//! gauges are collected from application state on every scrape. Counters
//! owned by the warming engine come from `cachewarmer_core::metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

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
            "cachewarmer_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachewarmer_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cachewarmer_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Warmer Metrics (collected dynamically)
// =============================================================================

/// Scheduler running state (1 = running, 0 = stopped).
pub static WARMER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cachewarmer_warmer_running",
        "Whether the scheduler is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Passes completed since startup.
pub static WARMER_PASSES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cachewarmer_warmer_passes",
        "Passes completed since startup",
    )
    .unwrap()
});

// =============================================================================
// Dedup Store Metrics (collected dynamically)
// =============================================================================

pub static DEDUP_ATTEMPTED_HASHES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cachewarmer_dedup_attempted_hashes",
        "Info hashes with a recorded final decision",
    )
    .unwrap()
});

pub static DEDUP_CACHED_QUALITIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cachewarmer_dedup_cached_qualities",
        "Quality tiers recorded as cached",
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

    // Warmer
    registry.register(Box::new(WARMER_RUNNING.clone())).unwrap();
    registry.register(Box::new(WARMER_PASSES.clone())).unwrap();

    // Dedup store
    registry
        .register(Box::new(DEDUP_ATTEMPTED_HASHES.clone()))
        .unwrap();
    registry
        .register(Box::new(DEDUP_CACHED_QUALITIES.clone()))
        .unwrap();

    // Core metrics (passes, items, debrid calls)
    for metric in cachewarmer_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.status().await;
    WARMER_RUNNING.set(if status.running { 1 } else { 0 });
    WARMER_PASSES.set(status.passes_completed as i64);

    if let Some(stats) = state.dedup_stats() {
        DEDUP_ATTEMPTED_HASHES.set(stats.attempted_hashes as i64);
        DEDUP_CACHED_QUALITIES.set(stats.cached_qualities as i64);
    }
}

static HASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{40}").unwrap());
static IMDB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d{7,}").unwrap());
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = HASH_RE.replace_all(path, "{hash}");
    let result = IMDB_RE.replace_all(&result, "{imdb}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_hash() {
        let path = "/api/v1/hashes/a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
        assert_eq!(normalize_path(path), "/api/v1/hashes/{hash}");
    }

    #[test]
    fn test_normalize_path_imdb() {
        assert_eq!(
            normalize_path("/api/v1/items/tt0111161"),
            "/api/v1/items/{imdb}"
        );
    }

    #[test]
    fn test_normalize_path_numeric_middle() {
        let path = "/api/v1/series/12345/season/2";
        assert_eq!(normalize_path(path), "/api/v1/series/{id}/season/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("cachewarmer_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_warmer_metrics() {
        WARMER_RUNNING.set(0);
        WARMER_PASSES.set(0);
        DEDUP_ATTEMPTED_HASHES.set(0);
        DEDUP_CACHED_QUALITIES.set(0);
        HTTP_REQUESTS_IN_FLIGHT.set(0);

        let output = encode_metrics();

        assert!(output.contains("cachewarmer_warmer_running"));
        assert!(output.contains("cachewarmer_warmer_passes"));
        assert!(output.contains("cachewarmer_dedup_attempted_hashes"));
        assert!(output.contains("cachewarmer_dedup_cached_qualities"));
        assert!(output.contains("cachewarmer_http_requests_in_flight"));
    }
}
