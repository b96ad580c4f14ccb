//! Node bookkeeping types.

use serde::Serialize;
use std::collections::VecDeque;

/// Resource snapshot reported by a node's stat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeStats {
    /// CPU load, 0-100.
    pub cpu_usage: f64,
    /// Free RAM as a fraction of total, clamped to 0.0-1.0.
    pub free_ram_ratio: f64,
}

/// Performance history for a single node address.
///
/// Records outlive pool rotation so a node that cycles back in keeps
/// its sample history.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub address: String,
    /// Recent health-check response times, newest last, bounded window.
    pub samples: VecDeque<u32>,
    /// Whether the last probe succeeded.
    pub healthy: bool,
    /// Whether this address has ever been probed.
    pub probed: bool,
    pub stats: Option<NodeStats>,
}

impl NodeRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            samples: VecDeque::new(),
            healthy: false,
            probed: false,
            stats: None,
        }
    }

    /// Mean response time over the sample window, if any samples exist.
    pub fn mean_response_time_ms(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|&ms| ms as u64).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    pub fn record_success(&mut self, response_time_ms: u32, stats: Option<NodeStats>, window: usize) {
        self.samples.push_back(response_time_ms);
        while self.samples.len() > window {
            self.samples.pop_front();
        }
        self.healthy = true;
        self.probed = true;
        if stats.is_some() {
            self.stats = stats;
        }
    }

    pub fn record_failure(&mut self) {
        self.healthy = false;
        self.probed = true;
    }
}

/// Snapshot of one node for the status API.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub address: String,
    pub active: bool,
    pub healthy: bool,
    pub probed: bool,
    pub mean_response_time_ms: Option<f64>,
    pub sample_count: usize,
    pub stats: Option<NodeStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_response_time_empty() {
        let record = NodeRecord::new("http://n1:3000");
        assert!(record.mean_response_time_ms().is_none());
    }

    #[test]
    fn test_sample_window_is_bounded() {
        let mut record = NodeRecord::new("http://n1:3000");
        for ms in [100, 200, 300, 400, 500, 600, 700] {
            record.record_success(ms, None, 5);
        }
        assert_eq!(record.samples.len(), 5);
        // Oldest two dropped, mean over 300..=700
        assert_eq!(record.mean_response_time_ms(), Some(500.0));
    }

    #[test]
    fn test_failure_keeps_history() {
        let mut record = NodeRecord::new("http://n1:3000");
        record.record_success(120, None, 5);
        record.record_failure();
        assert!(!record.healthy);
        assert!(record.probed);
        assert_eq!(record.samples.len(), 1);
    }
}
