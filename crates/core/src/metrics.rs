//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Queue (enqueues, passes, per-item outcomes, depth)
//! - Transfers (uploads, bytes, post creation)
//! - Node pool (probes, healthy count)
//! - Token lifecycle (refreshes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Queue
// =============================================================================

/// Items accepted into the queue.
pub static QUEUE_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("postpipe_queue_enqueued_total", "Total items enqueued").unwrap()
});

/// Processing passes started.
pub static QUEUE_PASSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "postpipe_queue_passes_total",
        "Total queue processing passes",
    )
    .unwrap()
});

/// Per-item outcomes of a processing pass.
pub static QUEUE_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "postpipe_queue_items_total",
            "Queue items handled by outcome",
        ),
        &["outcome"], // "success", "dropped", "retried", "deferred"
    )
    .unwrap()
});

/// Items currently persisted in the queue.
pub static QUEUE_DEPTH: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("postpipe_queue_depth", "Items pending in the queue").unwrap());

// =============================================================================
// Transfers
// =============================================================================

/// Storage uploads by result.
pub static UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpipe_uploads_total", "Total storage uploads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Bytes pushed to storage on successful uploads.
pub static UPLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("postpipe_uploaded_bytes_total", "Total bytes uploaded").unwrap()
});

/// Upload duration in seconds.
pub static UPLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "postpipe_upload_duration_seconds",
            "Duration of storage uploads",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &[],
    )
    .unwrap()
});

/// Post creation calls by result.
pub static POSTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpipe_posts_total", "Total post creation calls"),
        &["result"], // "success", "failed", "unauthorized"
    )
    .unwrap()
});

// =============================================================================
// Node pool
// =============================================================================

/// Node health probes by result.
pub static NODE_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpipe_node_probes_total", "Total node health probes"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Healthy nodes in the active pool after the last probe cycle.
pub static NODES_HEALTHY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("postpipe_nodes_healthy", "Healthy nodes in the active pool").unwrap()
});

// =============================================================================
// Token lifecycle
// =============================================================================

/// Bearer token refreshes by result.
pub static TOKEN_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postpipe_token_refreshes_total", "Total bearer token refreshes"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(QUEUE_ENQUEUED.clone()),
        Box::new(QUEUE_PASSES.clone()),
        Box::new(QUEUE_ITEMS.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        // Transfers
        Box::new(UPLOADS.clone()),
        Box::new(UPLOADED_BYTES.clone()),
        Box::new(UPLOAD_DURATION.clone()),
        Box::new(POSTS.clone()),
        // Node pool
        Box::new(NODE_PROBES.clone()),
        Box::new(NODES_HEALTHY.clone()),
        // Token lifecycle
        Box::new(TOKEN_REFRESHES.clone()),
    ]
}
