//! Queue persistence trait.

use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

use super::types::QueueItem;

/// Errors from queue persistence.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue item not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for queue items and queue-level metadata.
///
/// Implementations are synchronous; the processor calls them between
/// awaits, matching how little time each call holds the connection.
pub trait QueueStore: Send + Sync {
    fn insert(&self, item: &QueueItem) -> Result<(), QueueError>;

    fn get(&self, id: &str) -> Result<Option<QueueItem>, QueueError>;

    /// Pending items in insertion order.
    fn list_pending(&self) -> Result<Vec<QueueItem>, QueueError>;

    fn count(&self) -> Result<usize, QueueError>;

    /// Points the item at a new file, used when preparation replaces
    /// the original with the transcoded output.
    fn update_media_path(&self, id: &str, path: &Path) -> Result<(), QueueError>;

    /// Bumps the retry counter and stamps the attempt time. Returns
    /// the new counter value.
    fn record_attempt(&self, id: &str, at: DateTime<Utc>) -> Result<u32, QueueError>;

    fn remove(&self, id: &str) -> Result<(), QueueError>;

    /// Queue-level key/value metadata (e.g. the last streak day).
    fn meta_get(&self, key: &str) -> Result<Option<String>, QueueError>;

    fn meta_set(&self, key: &str, value: &str) -> Result<(), QueueError>;
}
