//! Connectivity probe seam.
//!
//! Processing is a deliberate no-op while offline; items stay queued
//! untouched until a later pass finds the network back.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ConnectivityConfig;

/// Answers "is the network reachable right now".
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probes a well-known endpoint with a short timeout.
pub struct HttpConnectivityProbe {
    client: reqwest::Client,
    probe_url: String,
}

impl HttpConnectivityProbe {
    pub fn new(config: ConnectivityConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self {
            client,
            probe_url: config.probe_url,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.probe_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "connectivity probe failed");
                false
            }
        }
    }
}
