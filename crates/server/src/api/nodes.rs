//! Backend node pool API handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use postpipe_core::nodes::NodeStatus;

use crate::state::AppState;

/// Response for node pool queries
#[derive(Debug, Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeStatus>,
}

/// List all configured nodes with their pool state
pub async fn list_nodes(State(state): State<Arc<AppState>>) -> Json<NodesResponse> {
    Json(NodesResponse {
        nodes: state.selector().status(),
    })
}

/// Probe the active pool now instead of waiting for the next cycle
pub async fn probe_nodes(State(state): State<Arc<AppState>>) -> Json<NodesResponse> {
    state.selector().run_probe_cycle().await;
    Json(NodesResponse {
        nodes: state.selector().status(),
    })
}
