//! Health and resource probing for backend nodes.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

use crate::config::NodesConfig;

use super::types::NodeStats;
use super::NodeError;

/// Result of one successful probe round against a node.
#[derive(Debug, Clone, Copy)]
pub struct ProbeReport {
    /// Round-trip time of the keepalive call.
    pub response_time_ms: u32,
    /// Resource stats, when the node's stat endpoint answered.
    pub stats: Option<NodeStats>,
}

/// Probes one node address for liveness and resource stats.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, address: &str) -> Result<ProbeReport, NodeError>;
}

/// HTTP probe hitting `/keepalive` (timed) and `/stat` (best effort).
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct StatResponse {
    #[serde(rename = "freeRAM")]
    free_ram: f64,
    #[serde(rename = "totalRAM")]
    total_ram: f64,
    #[serde(rename = "cpuUsage")]
    cpu_usage: f64,
}

impl HttpHealthProbe {
    pub fn new(config: &NodesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.probe_timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn fetch_stats(&self, address: &str) -> Option<NodeStats> {
        let response = self
            .client
            .get(format!("{}/stat", address))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let stat: StatResponse = response.json().await.ok()?;
        if stat.total_ram <= 0.0 {
            return None;
        }
        Some(NodeStats {
            cpu_usage: stat.cpu_usage,
            free_ram_ratio: (stat.free_ram / stat.total_ram).min(1.0),
        })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, address: &str) -> Result<ProbeReport, NodeError> {
        let started = Instant::now();
        let response = self
            .client
            .get(format!("{}/keepalive", address))
            .send()
            .await
            .map_err(|e| NodeError::Unreachable {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let response_time_ms = started.elapsed().as_millis().min(u32::MAX as u128) as u32;

        if !response.status().is_success() {
            return Err(NodeError::BadStatus {
                address: address.to_string(),
                status: response.status().as_u16(),
            });
        }

        // A node without stats still counts as alive.
        let stats = self.fetch_stats(address).await;
        debug!(address, response_time_ms, has_stats = stats.is_some(), "node probed");

        Ok(ProbeReport {
            response_time_ms,
            stats,
        })
    }
}
