//! Backend node pool: health checking, rotation and performance scoring.
//!
//! The selector keeps a bounded active pool out of the configured
//! candidates, re-probes it on a fixed cycle, and answers two questions:
//! `next_node()` round-robins the healthy set for cheap fan-out calls,
//! `best_node()` ranks by response time, free RAM and CPU load for the
//! post-creation call. When every active node looks unhealthy the pool
//! is refreshed and, failing that, the stale set is served rather than
//! no node at all.

mod probe;
mod selector;
mod types;

pub use probe::{HealthProbe, HttpHealthProbe, ProbeReport};
pub use selector::NodeSelector;
pub use types::{NodeRecord, NodeStats, NodeStatus};

use thiserror::Error;

/// Errors from probing a backend node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Node {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("Node {address} answered health check with status {status}")]
    BadStatus { address: String, status: u16 },

    #[error("HTTP error probing node: {0}")]
    Http(#[from] reqwest::Error),
}
