//! The upload pass: transcode, upload, post, clean up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::connectivity::ConnectivityProbe;
use crate::metrics;
use crate::nodes::NodeSelector;
use crate::retry::RetryPolicy;
use crate::token::{Clock, TokenError, TokenLifecycleManager};
use crate::transcoder::{MediaKind, TranscodeError, TranscodeJob, TranscodeProgress, Transcoder};
use crate::uploader::{
    thumbnail_object_name, video_object_name, PostClient, PostError, PostRequest, StorageClient,
    UploadError, UploadRequest,
};

use super::store::{QueueError, QueueStore};
use super::types::{EnqueueRequest, MediaPayload, PassSummary, ProcessOutcome, QueueItem};

const STREAK_META_KEY: &str = "streak_last_day";

/// Observer for per-item progress, 0 through 100.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, item_id: &str, percent: u8);
}

/// Everything that can go wrong while handling one item.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ItemError {
    fn is_retryable(&self) -> bool {
        match self {
            ItemError::Transcode(e) => e.is_retryable(),
            ItemError::Upload(e) => e.is_retryable(),
            ItemError::Post(e) => e.is_retryable(),
            ItemError::Token(e) => e.is_retryable(),
            ItemError::Queue(_) => true,
            ItemError::Io(_) => true,
        }
    }
}

/// Resets the single-flight flag when a pass ends, however it ends.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the queue: enqueues new items and runs processing passes.
///
/// A pass is single-flight; a second `process()` call while one runs
/// returns immediately. All collaborators sit behind trait objects so
/// tests can swap in recorders.
pub struct UploadProcessor {
    store: Arc<dyn QueueStore>,
    transcoder: Arc<dyn Transcoder>,
    storage: Arc<dyn StorageClient>,
    posts: Arc<dyn PostClient>,
    connectivity: Arc<dyn ConnectivityProbe>,
    nodes: Arc<NodeSelector>,
    tokens: Arc<TokenLifecycleManager>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    queue_dir: PathBuf,
    running: AtomicBool,
    listeners: Mutex<Vec<(String, Arc<dyn ProgressListener>)>>,
}

impl UploadProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn QueueStore>,
        transcoder: Arc<dyn Transcoder>,
        storage: Arc<dyn StorageClient>,
        posts: Arc<dyn PostClient>,
        connectivity: Arc<dyn ConnectivityProbe>,
        nodes: Arc<NodeSelector>,
        tokens: Arc<TokenLifecycleManager>,
        clock: Arc<dyn Clock>,
        config: QueueConfig,
    ) -> Self {
        Self {
            store,
            transcoder,
            storage,
            posts,
            connectivity,
            nodes,
            tokens,
            clock,
            retry: config.retry,
            queue_dir: PathBuf::from(config.dir),
            running: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a listener under an id, replacing any existing one
    /// with the same id.
    pub fn add_progress_listener(&self, id: impl Into<String>, listener: Arc<dyn ProgressListener>) {
        let id = id.into();
        let mut listeners = self.listeners.lock().expect("listener lock poisoned");
        listeners.retain(|(existing, _)| *existing != id);
        listeners.push((id, listener));
    }

    pub fn remove_progress_listener(&self, id: &str) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .retain(|(existing, _)| existing != id);
    }

    fn emit_progress(&self, item_id: &str, percent: u8) {
        let listeners = self.listeners.lock().expect("listener lock poisoned");
        for (_, listener) in listeners.iter() {
            listener.on_progress(item_id, percent);
        }
    }

    /// Takes ownership of the source file and persists a queue item.
    ///
    /// The file is moved into the queue directory before the row is
    /// written, so a crash in between leaves an orphan file, never a
    /// row pointing at nothing it could have owned.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<QueueItem, QueueError> {
        if !request.source_path.exists() {
            return Err(QueueError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source file missing: {}", request.source_path.display()),
            )));
        }

        tokio::fs::create_dir_all(&self.queue_dir).await?;

        let id = Uuid::new_v4().to_string();
        let extension = request
            .source_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string())
            .unwrap_or_else(|| request.kind.prepared_extension().to_string());
        let dest = self.queue_dir.join(format!("{id}.{extension}"));
        move_file(&request.source_path, &dest).await?;

        let item = QueueItem {
            id,
            created_at: Utc::now(),
            media: MediaPayload {
                file_path: dest,
                kind: request.kind,
                content_type: request.kind.prepared_content_type().to_string(),
            },
            options: request.options,
            retry_count: 0,
            last_attempt_at: None,
        };
        self.store.insert(&item)?;

        metrics::QUEUE_ENQUEUED.inc();
        metrics::QUEUE_DEPTH.set(self.store.count()? as i64);
        info!(item = %item.id, kind = ?item.media.kind, "item enqueued");
        Ok(item)
    }

    /// Runs one processing pass over all pending items.
    pub async fn process(&self) -> Result<ProcessOutcome, QueueError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("processing pass already running");
            return Ok(ProcessOutcome::AlreadyRunning);
        }
        let _guard = PassGuard(&self.running);

        if !self.connectivity.is_online().await {
            debug!("offline, leaving queue untouched");
            return Ok(ProcessOutcome::Offline);
        }

        let items = self.store.list_pending()?;
        let mut summary = PassSummary::default();

        for item in items {
            summary.processed += 1;
            let now = self.clock.now();

            if !self
                .retry
                .is_eligible(item.retry_count, item.last_attempt_at, now)
            {
                summary.deferred += 1;
                metrics::QUEUE_ITEMS.with_label_values(&["deferred"]).inc();
                continue;
            }

            if !item.media.file_path.exists() {
                warn!(item = %item.id, path = %item.media.file_path.display(), "backing file missing, dropping item");
                self.store.remove(&item.id)?;
                summary.dropped += 1;
                metrics::QUEUE_ITEMS.with_label_values(&["dropped"]).inc();
                continue;
            }

            self.emit_progress(&item.id, 0);
            match self.handle_item(&item).await {
                Ok(prepared_path) => {
                    self.store.remove(&item.id)?;
                    let _ = tokio::fs::remove_file(&prepared_path).await;
                    self.emit_progress(&item.id, 100);
                    summary.succeeded += 1;
                    metrics::QUEUE_ITEMS.with_label_values(&["success"]).inc();
                    info!(item = %item.id, "item posted and removed");
                }
                Err(e) if e.is_retryable() => {
                    let count = self.store.record_attempt(&item.id, now)?;
                    if self.retry.is_exhausted(count) {
                        warn!(item = %item.id, error = %e, retries = count, "retries exhausted, dropping item");
                        self.drop_item(&item).await?;
                        summary.dropped += 1;
                        metrics::QUEUE_ITEMS.with_label_values(&["dropped"]).inc();
                    } else {
                        warn!(item = %item.id, error = %e, retries = count, "item failed, will retry");
                        summary.retried += 1;
                        metrics::QUEUE_ITEMS.with_label_values(&["retried"]).inc();
                    }
                }
                Err(e) => {
                    warn!(item = %item.id, error = %e, "permanent failure, dropping item");
                    self.drop_item(&item).await?;
                    summary.dropped += 1;
                    metrics::QUEUE_ITEMS.with_label_values(&["dropped"]).inc();
                }
            }
        }

        metrics::QUEUE_PASSES.inc();
        metrics::QUEUE_DEPTH.set(self.store.count()? as i64);
        Ok(ProcessOutcome::Completed(summary))
    }

    /// Removes the row and its backing file, following any path update
    /// preparation made.
    async fn drop_item(&self, item: &QueueItem) -> Result<(), QueueError> {
        let path = self
            .store
            .get(&item.id)?
            .map(|i| i.media.file_path)
            .unwrap_or_else(|| item.media.file_path.clone());
        self.store.remove(&item.id)?;
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    async fn handle_item(&self, item: &QueueItem) -> Result<PathBuf, ItemError> {
        let bearer = self.tokens.bearer().await?;
        let user_id = self.tokens.user_id().await;

        let job = TranscodeJob {
            job_id: item.id.clone(),
            input_path: item.media.file_path.clone(),
            kind: item.media.kind,
        };
        let (progress_tx, mut progress_rx) = mpsc::channel::<TranscodeProgress>(16);
        let prepare = self.transcoder.prepare_with_progress(job, progress_tx);
        tokio::pin!(prepare);
        let result = loop {
            tokio::select! {
                Some(update) = progress_rx.recv() => {
                    self.emit_progress(&item.id, scale_transcode_percent(update.percent));
                }
                result = &mut prepare => break result,
            }
        };
        // Drain updates that were buffered behind completion.
        while let Ok(update) = progress_rx.try_recv() {
            self.emit_progress(&item.id, scale_transcode_percent(update.percent));
        }
        let result = result?;
        let prepared = result.output_path.clone();
        if prepared != item.media.file_path {
            self.store.update_media_path(&item.id, &prepared)?;
        }
        self.emit_progress(&item.id, 30);

        let (thumbnail_url, video_url) = match item.media.kind {
            MediaKind::Image => {
                let data = tokio::fs::read(&prepared).await?;
                let object = self
                    .storage
                    .upload(UploadRequest {
                        object_name: thumbnail_object_name(&user_id),
                        content_type: item.media.content_type.clone(),
                        creator: user_id.clone(),
                        data,
                        bearer: bearer.clone(),
                    })
                    .await?;
                self.emit_progress(&item.id, 90);
                (object.public_url, None)
            }
            MediaKind::Video => {
                let thumb_path = self.transcoder.extract_thumbnail(&prepared).await?;
                let thumb_data = tokio::fs::read(&thumb_path).await;
                let thumb_result = match thumb_data {
                    Ok(data) => {
                        self.storage
                            .upload(UploadRequest {
                                object_name: thumbnail_object_name(&user_id),
                                content_type: "image/jpeg".to_string(),
                                creator: user_id.clone(),
                                data,
                                bearer: bearer.clone(),
                            })
                            .await
                            .map_err(ItemError::from)
                    }
                    Err(e) => Err(ItemError::from(e)),
                };
                let _ = tokio::fs::remove_file(&thumb_path).await;
                let thumb = thumb_result?;
                self.emit_progress(&item.id, 60);

                let data = tokio::fs::read(&prepared).await?;
                let video = self
                    .storage
                    .upload(UploadRequest {
                        object_name: video_object_name(&user_id),
                        content_type: item.media.content_type.clone(),
                        creator: user_id.clone(),
                        data,
                        bearer: bearer.clone(),
                    })
                    .await?;
                self.emit_progress(&item.id, 90);
                (thumb.public_url, Some(video.public_url))
            }
        };

        let streak_date_key = self.todays_streak_key()?;
        let request = PostRequest {
            thumbnail_url,
            video_url,
            caption: item.options.caption.clone(),
            overlays: item.options.overlays.clone(),
            recipients: item.options.recipients.clone(),
            streak_date_key,
        };

        let node = self.nodes.best_node();
        match self.posts.create_post(&node, &request, &bearer).await {
            Ok(()) => {}
            Err(PostError::Unauthorized) => {
                // The token looked fresh locally but the backend
                // disagreed. One forced refresh, then give up.
                debug!(item = %item.id, "bearer rejected, forcing refresh");
                let bearer = self.tokens.force_refresh().await?;
                self.posts.create_post(&node, &request, &bearer).await?;
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(key) = streak_date_key {
            self.store.meta_set(STREAK_META_KEY, &key.to_string())?;
        }

        Ok(prepared)
    }

    /// Today's date key when the streak has not been credited yet.
    fn todays_streak_key(&self) -> Result<Option<u32>, QueueError> {
        let today = self
            .clock
            .now()
            .with_timezone(&Local)
            .format("%Y%m%d")
            .to_string();
        let last = self.store.meta_get(STREAK_META_KEY)?;
        if last.as_deref() == Some(today.as_str()) {
            return Ok(None);
        }
        Ok(today.parse::<u32>().ok())
    }
}

/// Transcoding owns the 0 through 30 span of item progress.
fn scale_transcode_percent(percent: f32) -> u8 {
    (percent.clamp(0.0, 100.0) * 0.3).round() as u8
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        // Cross-device moves fall back to copy + remove.
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodesConfig, ScoreWeights};
    use crate::testing::{
        MockClock, MockConnectivityProbe, MockHealthProbe, MockPostClient, MockStorageClient,
        MockTokenRefresher, MockTranscoder,
    };
    use crate::token::TokenState;
    use crate::queue::{PostOptions, SqliteQueueStore};
    use chrono::Duration;
    use tempfile::TempDir;

    struct Fixture {
        processor: UploadProcessor,
        store: Arc<SqliteQueueStore>,
        transcoder: Arc<MockTranscoder>,
        storage: Arc<MockStorageClient>,
        posts: Arc<MockPostClient>,
        connectivity: Arc<MockConnectivityProbe>,
        _queue_dir: TempDir,
    }

    fn fixture() -> Fixture {
        let queue_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteQueueStore::in_memory().unwrap());
        let transcoder = Arc::new(MockTranscoder::new());
        let storage = Arc::new(MockStorageClient::new());
        let posts = Arc::new(MockPostClient::new());
        let connectivity = Arc::new(MockConnectivityProbe::online());
        let now = Utc::now();
        let clock = Arc::new(MockClock::at(now));
        let refresher = Arc::new(MockTokenRefresher::new());
        let tokens = Arc::new(TokenLifecycleManager::new(
            TokenState {
                bearer: "bearer".to_string(),
                refresh_token: "rt".to_string(),
                user_id: "u1".to_string(),
                expires_at: now + Duration::hours(2),
            },
            refresher,
            clock.clone(),
        ));
        let nodes = Arc::new(NodeSelector::new(
            NodesConfig {
                addresses: vec!["http://n1".to_string()],
                max_active: 5,
                sample_window: 5,
                health_interval_secs: 30,
                probe_timeout_secs: 5,
                post_path: "/posts".to_string(),
                post_timeout_secs: 30,
                score: ScoreWeights::default(),
            },
            Arc::new(MockHealthProbe::new()),
        ));

        let processor = UploadProcessor::new(
            store.clone(),
            transcoder.clone(),
            storage.clone(),
            posts.clone(),
            connectivity.clone(),
            nodes,
            tokens,
            clock,
            QueueConfig {
                dir: queue_dir.path().to_path_buf(),
                retry: RetryPolicy::default(),
            },
        );

        Fixture {
            processor,
            store,
            transcoder,
            storage,
            posts,
            connectivity,
            _queue_dir: queue_dir,
        }
    }

    fn write_source(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_enqueue_moves_file_and_persists() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);

        let item = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: source.clone(),
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        assert!(!source.exists());
        assert!(item.media.file_path.exists());
        assert_eq!(fx.store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_missing_source() {
        let fx = fixture();
        let result = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: PathBuf::from("/nonexistent/source.jpg"),
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_offline_pass_is_a_no_op() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);
        fx.processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        fx.connectivity.set_online(false);
        let outcome = fx.processor.process().await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Offline);
        assert_eq!(fx.store.count().unwrap(), 1);
        assert_eq!(fx.storage.upload_count().await, 0);
    }

    #[tokio::test]
    async fn test_image_item_flows_to_post_and_is_removed() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);
        let item = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Image,
                options: PostOptions {
                    caption: Some("hi".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => {
                assert_eq!(summary.succeeded, 1);
                assert_eq!(summary.dropped, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(fx.store.count().unwrap(), 0);
        assert!(!item.media.file_path.exists());
        assert_eq!(fx.storage.upload_count().await, 1);
        let posts = fx.posts.posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].request.caption.as_deref(), Some("hi"));
        assert!(posts[0].request.video_url.is_none());
    }

    #[tokio::test]
    async fn test_missing_backing_file_drops_item() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);
        let item = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await
            .unwrap();
        std::fs::remove_file(&item.media.file_path).unwrap();

        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => {
                assert_eq!(summary.dropped, 1);
                assert_eq!(summary.succeeded, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fx.store.count().unwrap(), 0);
        assert_eq!(fx.storage.upload_count().await, 0);
    }

    #[tokio::test]
    async fn test_transient_failure_bumps_retry_counter() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);
        let item = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        fx.storage
            .fail_next(UploadError::UploadRejected { status: 503 })
            .await;
        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => assert_eq!(summary.retried, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let stored = fx.store.get(&item.id).unwrap().unwrap();
        assert_eq!(stored.retry_count, 1);
        assert!(stored.last_attempt_at.is_some());
        assert!(stored.media.file_path.exists());
    }

    #[tokio::test]
    async fn test_permanent_failure_drops_item_and_file() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "clip.mp4", 64);
        let item = fx
            .processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Video,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        fx.transcoder
            .set_next_error(TranscodeError::StillOversized {
                size_bytes: 9_000_000,
                target_bytes: 5_000_000,
            })
            .await;

        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => assert_eq!(summary.dropped, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fx.store.count().unwrap(), 0);
        assert!(!item.media.file_path.exists());
    }

    #[tokio::test]
    async fn test_unauthorized_post_forces_one_refresh() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "photo.jpg", 64);
        fx.processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Image,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        fx.posts.fail_next(PostError::Unauthorized).await;
        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => assert_eq!(summary.succeeded, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // First call rejected, second with the refreshed bearer.
        assert_eq!(fx.posts.posts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_streak_marker_sent_once_per_day() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.jpg"] {
            let source = write_source(src_dir.path(), name, 64);
            fx.processor
                .enqueue(EnqueueRequest {
                    source_path: source,
                    kind: MediaKind::Image,
                    options: PostOptions::default(),
                })
                .await
                .unwrap();
        }

        let outcome = fx.processor.process().await.unwrap();
        match outcome {
            ProcessOutcome::Completed(summary) => assert_eq!(summary.succeeded, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let posts = fx.posts.posts().await;
        assert_eq!(posts.len(), 2);
        assert!(posts[0].request.streak_date_key.is_some());
        assert!(posts[1].request.streak_date_key.is_none());
    }

    #[tokio::test]
    async fn test_items_processed_in_insertion_order() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let mut expected = Vec::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            let source = write_source(src_dir.path(), name, 64);
            let item = fx
                .processor
                .enqueue(EnqueueRequest {
                    source_path: source,
                    kind: MediaKind::Image,
                    options: PostOptions {
                        caption: Some(name.to_string()),
                        ..Default::default()
                    },
                })
                .await
                .unwrap();
            expected.push(item.id);
        }

        fx.processor.process().await.unwrap();
        let captions: Vec<String> = fx
            .posts
            .posts()
            .await
            .into_iter()
            .map(|p| p.request.caption.unwrap())
            .collect();
        assert_eq!(captions, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn test_video_item_uploads_thumbnail_then_video() {
        let fx = fixture();
        let src_dir = TempDir::new().unwrap();
        let source = write_source(src_dir.path(), "clip.mp4", 128);
        fx.processor
            .enqueue(EnqueueRequest {
                source_path: source,
                kind: MediaKind::Video,
                options: PostOptions::default(),
            })
            .await
            .unwrap();

        fx.processor.process().await.unwrap();

        let uploads = fx.storage.uploads().await;
        assert_eq!(uploads.len(), 2);
        assert!(uploads[0].object_name.contains("/thumbnails/"));
        assert_eq!(uploads[0].content_type, "image/jpeg");
        assert!(uploads[1].object_name.contains("/videos/"));
        assert_eq!(uploads[1].content_type, "video/mp4");

        let posts = fx.posts.posts().await;
        assert_eq!(posts.len(), 1);
        assert!(posts[0].request.video_url.is_some());
        assert_eq!(fx.transcoder.prepare_count().await, 1);
    }
}
