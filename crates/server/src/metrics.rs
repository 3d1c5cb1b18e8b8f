//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the bookshelf server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Cache residency per collection (collected dynamically)
//! - Engine metrics registered from `bookshelf_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

use bookshelf_core::{LoadState, ShelfStats};

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
            "bookshelf_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookshelf_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "bookshelf_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics (collected dynamically)
// =============================================================================

/// Records resident in the cache.
pub static CACHE_RESIDENT_RECORDS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "bookshelf_cache_resident_records",
            "Records currently resident in the cache",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Collection size as reported by the remote catalog, -1 while unknown.
pub static CACHE_TOTAL_COUNT: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "bookshelf_cache_total_count",
            "Known size of each collection (-1 while unknown)",
        ),
        &["kind"],
    )
    .unwrap()
});

/// 1 once a collection is fully resident.
pub static CACHE_DENSE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("bookshelf_cache_dense", "Whether a collection is fully resident"),
        &["kind"],
    )
    .unwrap()
});

/// 1 while a bulk load runs for the collection.
pub static BULK_LOAD_RUNNING: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "bookshelf_bulk_load_running",
            "Whether a bulk load is in progress",
        ),
        &["kind"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP metrics
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Cache metrics
    registry
        .register(Box::new(CACHE_RESIDENT_RECORDS.clone()))
        .unwrap();
    registry
        .register(Box::new(CACHE_TOTAL_COUNT.clone()))
        .unwrap();
    registry.register(Box::new(CACHE_DENSE.clone())).unwrap();
    registry
        .register(Box::new(BULK_LOAD_RUNNING.clone()))
        .unwrap();

    // Core metrics (remote client, loaders, search)
    for metric in bookshelf_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the cache gauges reflect the session as it is now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.session().status();
    record_shelf(&status.authors);
    record_shelf(&status.titles);
}

fn record_shelf(stats: &ShelfStats) {
    let kind = stats.kind.as_str();
    CACHE_RESIDENT_RECORDS
        .with_label_values(&[kind])
        .set(stats.resident as i64);
    CACHE_TOTAL_COUNT
        .with_label_values(&[kind])
        .set(stats.total_count.map(|t| t as i64).unwrap_or(-1));
    CACHE_DENSE
        .with_label_values(&[kind])
        .set(if stats.dense { 1 } else { 0 });
    BULK_LOAD_RUNNING
        .with_label_values(&[kind])
        .set(if matches!(stats.load_state, LoadState::BulkLoading(_)) { 1 } else { 0 });
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[0-9][0-9\-]*(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids and ISBNs with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Two passes: adjacent numeric segments share the separating slash.
    let result = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
