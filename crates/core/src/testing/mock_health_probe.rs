//! Mock node health probe.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::nodes::{HealthProbe, NodeError, ProbeReport};

/// Health probe answering from a configured table.
///
/// Addresses without a configured report fail as unreachable, which
/// is how tests simulate dead nodes.
pub struct MockHealthProbe {
    reports: Arc<RwLock<HashMap<String, ProbeReport>>>,
}

impl Default for MockHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthProbe {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Make probes of `address` succeed with this report.
    pub async fn set_report(&self, address: &str, report: ProbeReport) {
        self.reports
            .write()
            .await
            .insert(address.to_string(), report);
    }

    /// Make probes of `address` fail again.
    pub async fn clear_report(&self, address: &str) {
        self.reports.write().await.remove(address);
    }
}

#[async_trait]
impl HealthProbe for MockHealthProbe {
    async fn probe(&self, address: &str) -> Result<ProbeReport, NodeError> {
        match self.reports.read().await.get(address) {
            Some(report) => Ok(*report),
            None => Err(NodeError::Unreachable {
                address: address.to_string(),
                reason: "no mock report configured".to_string(),
            }),
        }
    }
}
