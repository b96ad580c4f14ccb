//! Object storage upload and post creation.
//!
//! Prepared media goes to object storage through the three-phase
//! resumable protocol (initiate, upload+finalize, fetch download
//! token), then a post referencing the public URLs is created on a
//! backend node. Each storage phase gets one immediate retry before
//! the error is surfaced to the queue's retry policy.

mod error;
mod overlay;
mod post;
mod resumable;
mod types;

pub use error::{PostError, UploadError};
pub use overlay::{CaptionOverlay, OverlayIcon};
pub use post::{HttpPostClient, PostClient, PostRequest};
pub use resumable::{ResumableStorageClient, StorageClient};
pub use types::{thumbnail_object_name, video_object_name, UploadRequest, UploadedObject};
