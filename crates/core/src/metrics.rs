//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Plex requests (per operation)
//! - Catalog index build
//! - Result caches

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts,
};

// =============================================================================
// Plex Server Metrics
// =============================================================================

/// Plex request duration in seconds.
pub static REMOTE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plexdex_remote_request_duration_seconds",
            "Duration of requests to the Plex server",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"], // "list_sections", "list_artists", "fetch_item", "search", ...
    )
    .unwrap()
});

/// Plex requests total by operation and status.
pub static REMOTE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexdex_remote_requests_total",
            "Total requests to the Plex server",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Index Metrics
// =============================================================================

/// Time taken by the last index build.
pub static INDEX_BUILD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "plexdex_index_build_duration_seconds",
            "Duration of the catalog index build",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

/// Indexed nodes by level.
pub static INDEX_NODES: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("plexdex_index_nodes", "Nodes in the catalog index"),
        &["level"], // "artist", "album", "track"
    )
    .unwrap()
});

/// Artist population failures, contained to the artist or album.
pub static POPULATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexdex_population_failures_total",
            "Failed album or track listings during the index build",
        ),
        &["stage"], // "albums", "tracks"
    )
    .unwrap()
});

/// Artists skipped because their name matched several indexed artists.
pub static MERGE_AMBIGUITIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "plexdex_merge_ambiguities_total",
        "Artists skipped because of an ambiguous merge target",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by cache and outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("plexdex_cache_lookups_total", "Result cache lookups"),
        &["cache", "result"], // cache: "browse", "lookup", "search"; result: "hit", "miss"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Plex
        Box::new(REMOTE_REQUEST_DURATION.clone()),
        Box::new(REMOTE_REQUESTS.clone()),
        // Index
        Box::new(INDEX_BUILD_DURATION.clone()),
        Box::new(INDEX_NODES.clone()),
        Box::new(POPULATION_FAILURES.clone()),
        Box::new(MERGE_AMBIGUITIES.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
    ]
}
