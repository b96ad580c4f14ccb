//! Mock storage client.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::uploader::{StorageClient, UploadError, UploadRequest, UploadedObject};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub object_name: String,
    pub content_type: String,
    pub creator: String,
    pub size_bytes: usize,
}

/// Storage client that records uploads and fabricates public URLs.
pub struct MockStorageClient {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    next_error: Arc<RwLock<Option<UploadError>>>,
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Fail the next upload with this error, once.
    pub async fn fail_next(&self, error: UploadError) {
        *self.next_error.write().await = Some(error);
    }

    /// All uploads attempted so far, including the failed ones.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }
}

#[async_trait]
impl StorageClient for MockStorageClient {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedObject, UploadError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut uploads = self.uploads.write().await;
        uploads.push(RecordedUpload {
            object_name: request.object_name.clone(),
            content_type: request.content_type.clone(),
            creator: request.creator.clone(),
            size_bytes: request.data.len(),
        });
        let token = format!("mock-token-{}", uploads.len());

        Ok(UploadedObject {
            public_url: format!(
                "https://storage.test/o/{}?alt=media&token={}",
                urlencoding::encode(&request.object_name),
                token
            ),
            object_name: request.object_name,
            download_token: token,
        })
    }
}
