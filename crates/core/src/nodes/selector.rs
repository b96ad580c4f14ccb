//! Active pool management and node ranking.

use futures::future::join_all;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::config::NodesConfig;
use crate::metrics;

use super::probe::HealthProbe;
use super::types::{NodeRecord, NodeStatus};

/// Slowest mean response time a node may have and still be kept across
/// a pool refresh, in milliseconds.
const KEEP_THRESHOLD_MS: f64 = 1000.0;

struct PoolState {
    /// Performance history for every configured address.
    records: HashMap<String, NodeRecord>,
    /// Addresses currently in the active pool, bounded by `max_active`.
    active: Vec<String>,
    /// Round-robin cursor over the active pool.
    cursor: usize,
}

/// Tracks backend node health and picks nodes for outgoing calls.
///
/// `next_node` round-robins the healthy actives; `best_node` ranks them
/// by response time, free RAM and CPU load. Both fall back to the stale
/// pool rather than returning no node.
pub struct NodeSelector {
    config: NodesConfig,
    probe: Arc<dyn HealthProbe>,
    state: Mutex<PoolState>,
}

impl NodeSelector {
    pub fn new(config: NodesConfig, probe: Arc<dyn HealthProbe>) -> Self {
        let records = config
            .addresses
            .iter()
            .map(|a| (a.clone(), NodeRecord::new(a.clone())))
            .collect();
        let active = config
            .addresses
            .iter()
            .take(config.max_active)
            .cloned()
            .collect();
        Self {
            config,
            probe,
            state: Mutex::new(PoolState {
                records,
                active,
                cursor: 0,
            }),
        }
    }

    /// Next node in round-robin order over the healthy actives.
    ///
    /// Falls back to the full active pool when nothing is healthy, so a
    /// caller always gets an address to try.
    pub fn next_node(&self) -> String {
        let mut state = self.state.lock().expect("node pool lock poisoned");
        let healthy: Vec<String> = state
            .active
            .iter()
            .filter(|a| state.records.get(*a).map(|r| r.healthy).unwrap_or(false))
            .cloned()
            .collect();
        let pool = if healthy.is_empty() {
            state.active.clone()
        } else {
            healthy
        };
        let picked = pool[state.cursor % pool.len()].clone();
        state.cursor = state.cursor.wrapping_add(1);
        picked
    }

    /// Highest scoring active node.
    pub fn best_node(&self) -> String {
        let state = self.state.lock().expect("node pool lock poisoned");
        let weights = &self.config.score;
        let mut candidates: Vec<&NodeRecord> = state
            .active
            .iter()
            .filter_map(|a| state.records.get(a))
            .filter(|r| r.healthy)
            .collect();
        if candidates.is_empty() {
            candidates = state
                .active
                .iter()
                .filter_map(|a| state.records.get(a))
                .collect();
        }

        let mut best: Option<(&NodeRecord, f64)> = None;
        for record in candidates {
            let rt = record.mean_response_time_ms().unwrap_or(f64::INFINITY);
            let mut score = -rt * weights.response_time;
            if let Some(stats) = record.stats {
                score += stats.free_ram_ratio * 100.0 * weights.free_ram;
                score -= stats.cpu_usage * weights.cpu;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((record, score)),
            }
        }

        best.map(|(r, _)| r.address.clone())
            .unwrap_or_else(|| self.config.addresses[0].clone())
    }

    /// Runs one probe round over the active pool.
    ///
    /// Probes run concurrently; if the whole pool comes back unhealthy
    /// the pool is refreshed so the next cycle tries other candidates.
    pub async fn run_probe_cycle(&self) {
        let active: Vec<String> = {
            let state = self.state.lock().expect("node pool lock poisoned");
            state.active.clone()
        };

        let probes = active.iter().map(|address| {
            let probe = Arc::clone(&self.probe);
            let address = address.clone();
            async move {
                let report = probe.probe(&address).await;
                (address, report)
            }
        });
        let results = join_all(probes).await;

        let mut state = self.state.lock().expect("node pool lock poisoned");
        let mut healthy_count = 0usize;
        for (address, result) in results {
            let record = state
                .records
                .entry(address.clone())
                .or_insert_with(|| NodeRecord::new(address.clone()));
            match result {
                Ok(report) => {
                    record.record_success(
                        report.response_time_ms,
                        report.stats,
                        self.config.sample_window,
                    );
                    healthy_count += 1;
                    metrics::NODE_PROBES.with_label_values(&["success"]).inc();
                }
                Err(e) => {
                    debug!(address = %address, error = %e, "node probe failed");
                    record.record_failure();
                    metrics::NODE_PROBES.with_label_values(&["failed"]).inc();
                }
            }
        }

        metrics::NODES_HEALTHY.set(healthy_count as i64);

        if healthy_count == 0 {
            warn!("active node pool fully unhealthy, refreshing");
            self.refresh_pool(&mut state);
        }
    }

    /// Probe loop at the configured interval. Runs until the task is
    /// aborted.
    pub async fn run(self: Arc<Self>) {
        let period = std::time::Duration::from_secs(self.config.health_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_probe_cycle().await;
        }
    }

    /// Rebuilds the active pool: keeps the fast healthy performers and
    /// rotates candidates into the remaining slots, unexplored first.
    fn refresh_pool(&self, state: &mut PoolState) {
        if self.config.addresses.len() <= self.config.max_active {
            state.active = self.config.addresses.clone();
            return;
        }

        let mut kept: Vec<String> = state
            .active
            .iter()
            .filter(|a| {
                state
                    .records
                    .get(*a)
                    .map(|r| {
                        r.healthy
                            && r.mean_response_time_ms()
                                .map(|rt| rt < KEEP_THRESHOLD_MS)
                                .unwrap_or(false)
                    })
                    .unwrap_or(false)
            })
            .take(self.config.max_active / 2)
            .cloned()
            .collect();

        let mut rng = rand::thread_rng();
        let mut unexplored: Vec<String> = self
            .config
            .addresses
            .iter()
            .filter(|a| {
                !kept.contains(a) && !state.records.get(*a).map(|r| r.probed).unwrap_or(false)
            })
            .cloned()
            .collect();
        unexplored.shuffle(&mut rng);

        let mut explored: Vec<String> = self
            .config
            .addresses
            .iter()
            .filter(|a| !kept.contains(a) && !unexplored.contains(a))
            .cloned()
            .collect();
        explored.shuffle(&mut rng);

        let slots = self.config.max_active.saturating_sub(kept.len());
        kept.extend(
            unexplored
                .into_iter()
                .chain(explored)
                .take(slots),
        );

        info!(pool = ?kept, "node pool refreshed");
        state.active = kept;
        state.cursor = 0;
    }

    /// Snapshot of every configured node for the status API.
    pub fn status(&self) -> Vec<NodeStatus> {
        let state = self.state.lock().expect("node pool lock poisoned");
        self.config
            .addresses
            .iter()
            .map(|address| {
                let record = state.records.get(address);
                NodeStatus {
                    address: address.clone(),
                    active: state.active.contains(address),
                    healthy: record.map(|r| r.healthy).unwrap_or(false),
                    probed: record.map(|r| r.probed).unwrap_or(false),
                    mean_response_time_ms: record.and_then(|r| r.mean_response_time_ms()),
                    sample_count: record.map(|r| r.samples.len()).unwrap_or(0),
                    stats: record.and_then(|r| r.stats),
                }
            })
            .collect()
    }
}
