//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Remote catalog requests (count, latency, failures)
//! - Bulk loading (batches by outcome)
//! - Page loading (cache hits vs remote fetches)
//! - Search and sorted views

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Remote Catalog
// =============================================================================

/// Remote requests total by endpoint and result.
pub static REMOTE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_remote_requests_total",
            "Total requests sent to the remote catalog",
        ),
        &["endpoint", "result"], // "success", "rate_limited", "not_found", ...
    )
    .unwrap()
});

/// Remote request duration in seconds.
pub static REMOTE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookshelf_remote_request_duration_seconds",
            "Duration of remote catalog requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Loaders
// =============================================================================

/// Bulk loader batches by kind and result.
pub static BULK_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_bulk_batches_total",
            "Total bulk loader batches",
        ),
        &["kind", "result"], // "loaded", "failed", "skipped"
    )
    .unwrap()
});

/// Page loads by kind and where the data came from.
pub static PAGE_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookshelf_page_loads_total", "Total on-demand page loads"),
        &["kind", "source"], // "cache", "remote", "out_of_range", "failed"
    )
    .unwrap()
});

// =============================================================================
// Search
// =============================================================================

/// Search evaluation time in seconds (excludes waiting for a bulk load).
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookshelf_search_duration_seconds",
            "Time spent evaluating searches against the local cache",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["kind"],
    )
    .unwrap()
});

/// Sorted view requests by kind and whether the memoized view was reused.
pub static SORTED_VIEWS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_sorted_view_total",
            "Sorted view requests",
        ),
        &["kind", "result"], // "hit", "rebuild"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REMOTE_REQUESTS.clone()),
        Box::new(REMOTE_REQUEST_DURATION.clone()),
        Box::new(BULK_BATCHES.clone()),
        Box::new(PAGE_LOADS.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SORTED_VIEWS.clone()),
    ]
}
