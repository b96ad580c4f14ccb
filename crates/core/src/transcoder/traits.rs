//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use super::error::TranscodeError;
use super::types::{MediaInfo, TranscodeJob, TranscodeProgress, TranscodeResult};

/// A transcoder that normalizes captured media for upload.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError>;

    /// Prepares a file for upload, returning the upload-ready path.
    ///
    /// Inputs already under the relevant target ceiling pass through.
    /// The returned path never points at an oversized file; when the
    /// pipeline cannot bring a video under the target the job fails
    /// with `StillOversized` instead.
    async fn prepare(&self, job: TranscodeJob) -> Result<TranscodeResult, TranscodeError>;

    /// Prepares a file with progress reporting.
    ///
    /// If the sender is dropped, preparation continues without progress
    /// reporting.
    async fn prepare_with_progress(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeResult, TranscodeError>;

    /// Renders a mid-video JPEG frame to use as the post thumbnail.
    async fn extract_thumbnail(&self, video_path: &Path) -> Result<PathBuf, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}
