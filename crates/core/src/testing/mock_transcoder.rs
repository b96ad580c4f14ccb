//! Mock transcoder.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::transcoder::{
    MediaInfo, TranscodeError, TranscodeJob, TranscodeProgress, TranscodeResult, Transcoder,
};

/// Transcoder that passes every file through untouched.
///
/// Controllable behavior:
/// - `set_next_error` fails the next `prepare`, once
/// - `set_probe_result` pins the info returned for a path
/// - thumbnails are real (tiny) files so callers can read them
/// - `prepare_with_progress` reports 50 then 100 percent, then delegates
///   to `prepare`
pub struct MockTranscoder {
    jobs: Arc<RwLock<Vec<TranscodeJob>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    next_error: Arc<RwLock<Option<TranscodeError>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Fail the next `prepare` with this error, once.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Pin the probe result for a path.
    pub async fn set_probe_result(&self, path: &Path, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.to_path_buf(), info);
    }

    /// All jobs submitted to `prepare`.
    pub async fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.read().await.clone()
    }

    pub async fn prepare_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }
        let size_bytes = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs: 10.0,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1080),
            video_height: Some(1080),
        })
    }

    async fn prepare(&self, job: TranscodeJob) -> Result<TranscodeResult, TranscodeError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.jobs.write().await.push(job.clone());
        let output_size_bytes = tokio::fs::metadata(&job.input_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(TranscodeResult {
            job_id: job.job_id,
            output_path: job.input_path,
            output_size_bytes,
            duration_ms: 1,
            passed_through: true,
        })
    }

    async fn prepare_with_progress(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeResult, TranscodeError> {
        for percent in [50.0, 100.0] {
            let _ = progress_tx
                .send(TranscodeProgress {
                    job_id: job.job_id.clone(),
                    percent,
                })
                .await;
        }
        self.prepare(job).await
    }

    async fn extract_thumbnail(&self, _video_path: &Path) -> Result<PathBuf, TranscodeError> {
        let path = std::env::temp_dir().join(format!("mock-thumb-{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, b"mock-thumbnail").await?;
        Ok(path)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
