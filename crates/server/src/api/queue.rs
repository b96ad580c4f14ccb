//! Upload queue API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use postpipe_core::queue::{PostOptions, ProcessOutcome, QueueItem};
use postpipe_core::transcoder::MediaKind;
use postpipe_core::uploader::CaptionOverlay;
use postpipe_core::{EnqueueRequest, QueueError};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for enqueueing a media file
#[derive(Debug, Deserialize)]
pub struct EnqueueBody {
    /// File the queue takes ownership of; it is moved into the queue
    /// directory before the request returns.
    pub file_path: String,
    /// "image" or "video"
    pub kind: MediaKind,
    /// Caption rendered on the post
    pub caption: Option<String>,
    /// Caption overlays sent with the post
    #[serde(default)]
    pub overlays: Vec<CaptionOverlay>,
    /// Friend user ids; empty means the whole friend list
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Response for queue item operations
#[derive(Debug, Serialize)]
pub struct QueueItemResponse {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub kind: MediaKind,
    pub content_type: String,
    pub caption: Option<String>,
    pub recipients: Vec<String>,
    pub retry_count: u32,
    pub last_attempt_at: Option<String>,
}

impl From<QueueItem> for QueueItemResponse {
    fn from(item: QueueItem) -> Self {
        Self {
            id: item.id,
            created_at: item.created_at.to_rfc3339(),
            file_path: item.media.file_path.display().to_string(),
            kind: item.media.kind,
            content_type: item.media.content_type,
            caption: item.options.caption,
            recipients: item.options.recipients,
            retry_count: item.retry_count,
            last_attempt_at: item.last_attempt_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Response for listing queue items
#[derive(Debug, Serialize)]
pub struct ListQueueResponse {
    pub items: Vec<QueueItemResponse>,
    pub total: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct QueueErrorResponse {
    pub error: String,
}

fn error_response(error: QueueError) -> (StatusCode, Json<QueueErrorResponse>) {
    let status = match &error {
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
        QueueError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(QueueErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Enqueue a media file for upload
pub async fn enqueue_item(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnqueueBody>,
) -> Result<(StatusCode, Json<QueueItemResponse>), impl IntoResponse> {
    let request = EnqueueRequest {
        source_path: PathBuf::from(body.file_path),
        kind: body.kind,
        options: PostOptions {
            caption: body.caption,
            overlays: body.overlays,
            recipients: body.recipients,
        },
    };

    match state.processor().enqueue(request).await {
        Ok(item) => Ok((StatusCode::CREATED, Json(QueueItemResponse::from(item)))),
        Err(e) => Err(error_response(e)),
    }
}

/// List pending queue items in insertion order
pub async fn list_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListQueueResponse>, impl IntoResponse> {
    match state.store().list_pending() {
        Ok(items) => {
            let items: Vec<QueueItemResponse> =
                items.into_iter().map(QueueItemResponse::from).collect();
            let total = items.len();
            Ok(Json(ListQueueResponse { items, total }))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Get a queue item by ID
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QueueItemResponse>, impl IntoResponse> {
    match state.store().get(&id) {
        Ok(Some(item)) => Ok(Json(QueueItemResponse::from(item))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(QueueErrorResponse {
                error: format!("Queue item not found: {}", id),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// Remove a queue item and the file it owns
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, impl IntoResponse> {
    let item = match state.store().get(&id) {
        Ok(Some(item)) => item,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(QueueErrorResponse {
                    error: format!("Queue item not found: {}", id),
                }),
            ))
        }
        Err(e) => return Err(error_response(e)),
    };

    if let Err(e) = state.store().remove(&id) {
        return Err(error_response(e));
    }
    // The row is gone; a leftover file is harmless.
    let _ = tokio::fs::remove_file(&item.media.file_path).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Run one processing pass over the queue
pub async fn process_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProcessOutcome>, impl IntoResponse> {
    match state.processor().process().await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err(error_response(e)),
    }
}
