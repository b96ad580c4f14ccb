//! Queue item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::transcoder::MediaKind;
use crate::uploader::CaptionOverlay;

/// The media file an item carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Current location of the file. Points into the queue directory
    /// after enqueue and follows the file through preparation.
    pub file_path: PathBuf,
    pub kind: MediaKind,
    /// MIME type the prepared file is uploaded as.
    pub content_type: String,
}

/// Post metadata captured at send time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostOptions {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub overlays: Vec<CaptionOverlay>,
    /// Friend user ids; empty means the whole friend list.
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// One persisted upload, owned exclusively by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub media: MediaPayload,
    pub options: PostOptions,
    pub retry_count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// What a caller hands to `enqueue`.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    /// File to take ownership of; it is moved into the queue directory.
    pub source_path: PathBuf,
    pub kind: MediaKind,
    pub options: PostOptions,
}

/// Counters from one processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PassSummary {
    /// Items looked at this pass.
    pub processed: usize,
    /// Uploaded, posted and removed.
    pub succeeded: usize,
    /// Removed without posting (missing file, permanent error,
    /// exhausted retries).
    pub dropped: usize,
    /// Failed transiently; retry counter bumped.
    pub retried: usize,
    /// Left untouched because their backoff has not elapsed.
    pub deferred: usize,
}

/// Result of a `process()` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Another pass holds the single-flight guard.
    AlreadyRunning,
    /// Connectivity probe failed; nothing was touched.
    Offline,
    Completed(PassSummary),
}
