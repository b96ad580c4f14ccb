//! Durable upload queue.
//!
//! Items are enqueued by moving the source file into the queue
//! directory and persisting a row, so a crash between send and upload
//! loses nothing. A processing pass is single-flight, skips everything
//! while offline, and walks pending items in insertion order: prepare
//! media, push it to storage, create the post, then delete the row and
//! the file. Failures either drop the item (permanent) or bump its
//! retry counter for a later pass.

mod processor;
mod sqlite_store;
mod store;
mod types;

pub use processor::{ProgressListener, UploadProcessor};
pub use sqlite_store::SqliteQueueStore;
pub use store::{QueueError, QueueStore};
pub use types::{
    EnqueueRequest, MediaPayload, PassSummary, PostOptions, ProcessOutcome, QueueItem,
};
