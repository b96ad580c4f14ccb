//! Three-phase resumable upload to object storage.
//!
//! Phase 1 initiates the upload and yields a session URL, phase 2 puts
//! the whole body and finalizes in one request, phase 3 fetches the
//! object's download token to build the tokenized public URL. Each
//! phase gets one immediate retry; anything beyond that is left to the
//! queue's backoff.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::metrics;

use super::types::{UploadRequest, UploadedObject};
use super::UploadError;

/// Pushes one object to storage and returns its public URL.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedObject, UploadError>;
}

pub struct ResumableStorageClient {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Deserialize)]
struct ObjectMetadata {
    #[serde(default, rename = "downloadTokens")]
    download_tokens: Option<String>,
}

impl ResumableStorageClient {
    pub fn new(config: StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// `{base_url}/{bucket}/o/{percent-encoded object name}`.
    fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/{}/o/{}",
            self.config.base_url,
            self.config.bucket,
            urlencoding::encode(object_name)
        )
    }

    async fn initiate(&self, request: &UploadRequest) -> Result<String, UploadError> {
        let url = format!(
            "{}?uploadType=resumable&name={}",
            self.object_url(&request.object_name),
            urlencoding::encode(&request.object_name)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&request.bearer)
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-command", "start")
            .header("x-goog-upload-content-length", request.data.len().to_string())
            .header("x-goog-upload-content-type", &request.content_type)
            .json(&json!({
                "name": request.object_name,
                "contentType": request.content_type,
                "bucket": "",
                "metadata": { "creator": request.creator, "visibility": "private" },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::InitiateRejected {
                status: status.as_u16(),
            });
        }

        response
            .headers()
            .get("X-Goog-Upload-URL")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or(UploadError::MissingSessionUrl)
    }

    async fn put_body(&self, session_url: &str, request: &UploadRequest) -> Result<(), UploadError> {
        let response = self
            .client
            .put(session_url)
            .header("content-type", "application/octet-stream")
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-offset", "0")
            .header("x-goog-upload-command", "upload, finalize")
            .body(request.data.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::UploadRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn fetch_download_token(&self, request: &UploadRequest) -> Result<String, UploadError> {
        let response = self
            .client
            .get(self.object_url(&request.object_name))
            .bearer_auth(&request.bearer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::TokenFetchRejected {
                status: status.as_u16(),
            });
        }

        let metadata: ObjectMetadata = response.json().await?;
        metadata
            .download_tokens
            .filter(|t| !t.is_empty())
            .ok_or(UploadError::MissingDownloadToken)
    }
}

/// Runs a phase once more on failure before giving up.
async fn retry_once<T, F, Fut>(phase: &str, mut op: F) -> Result<T, UploadError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, UploadError>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!(phase, error = %first, "upload phase failed, retrying once");
            op().await
        }
    }
}

#[async_trait]
impl StorageClient for ResumableStorageClient {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedObject, UploadError> {
        debug!(
            object = %request.object_name,
            bytes = request.data.len(),
            "starting resumable upload"
        );
        let started = std::time::Instant::now();

        let result = async {
            let session_url = retry_once("initiate", || self.initiate(&request)).await?;
            retry_once("upload", || self.put_body(&session_url, &request)).await?;
            let token = retry_once("token", || self.fetch_download_token(&request)).await?;
            Ok::<_, UploadError>(token)
        }
        .await;

        match result {
            Ok(token) => {
                metrics::UPLOADS.with_label_values(&["success"]).inc();
                metrics::UPLOADED_BYTES.inc_by(request.data.len() as u64);
                metrics::UPLOAD_DURATION
                    .with_label_values(&[])
                    .observe(started.elapsed().as_secs_f64());
                let public_url = format!(
                    "{}?alt=media&token={}",
                    self.object_url(&request.object_name),
                    token
                );
                info!(object = %request.object_name, "object uploaded");
                Ok(UploadedObject {
                    object_name: request.object_name,
                    public_url,
                    download_token: token,
                })
            }
            Err(e) => {
                metrics::UPLOADS.with_label_values(&["failed"]).inc();
                Err(e)
            }
        }
    }
}
