use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware, nodes, queue};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Upload queue
        .route("/queue", post(queue::enqueue_item))
        .route("/queue", get(queue::list_queue))
        .route("/queue/process", post(queue::process_queue))
        .route("/queue/{id}", get(queue::get_item))
        .route("/queue/{id}", delete(queue::delete_item))
        // Backend node pool
        .route("/nodes", get(nodes::list_nodes))
        .route("/nodes/probe", post(nodes::probe_nodes))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
