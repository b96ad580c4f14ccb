//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the pipeline's
//! external seams (transcoder, storage, post creation, connectivity,
//! node probing, token refresh, clock), allowing full queue lifecycle
//! tests without ffmpeg, a network, or real credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use postpipe_core::testing::{MockStorageClient, MockTranscoder};
//!
//! let storage = MockStorageClient::new();
//! let transcoder = MockTranscoder::new();
//!
//! // Configure mock behavior
//! storage.fail_next(UploadError::UploadRejected { status: 503 }).await;
//!
//! // Use in an UploadProcessor...
//! ```

mod mock_clock;
mod mock_connectivity;
mod mock_health_probe;
mod mock_post_client;
mod mock_storage;
mod mock_token_refresher;
mod mock_transcoder;

pub use mock_clock::MockClock;
pub use mock_connectivity::MockConnectivityProbe;
pub use mock_health_probe::MockHealthProbe;
pub use mock_post_client::{MockPostClient, RecordedPost};
pub use mock_storage::{MockStorageClient, RecordedUpload};
pub use mock_token_refresher::MockTokenRefresher;
pub use mock_transcoder::MockTranscoder;
