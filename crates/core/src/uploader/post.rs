//! Post creation against a backend node.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::NodesConfig;
use crate::metrics;

use super::overlay::{build_overlays, CaptionOverlay};
use super::PostError;

/// A post referencing uploaded media.
#[derive(Debug, Clone)]
pub struct PostRequest {
    /// Public URL of the thumbnail (the image itself for image posts).
    pub thumbnail_url: String,
    /// Public URL of the prepared video, for video posts.
    pub video_url: Option<String>,
    pub caption: Option<String>,
    pub overlays: Vec<CaptionOverlay>,
    /// Friend user ids; empty means everyone.
    pub recipients: Vec<String>,
    /// Date key (yyyymmdd) credited to the daily streak, when this is
    /// the first post of the local day.
    pub streak_date_key: Option<u32>,
}

impl PostRequest {
    /// Wire body for the post-creation endpoint.
    pub fn body(&self) -> Value {
        let mut data = json!({
            "thumbnail_url": self.thumbnail_url,
            "caption": self.caption.clone().unwrap_or_default(),
            "overlays": build_overlays(&self.overlays),
            "recipients": self.recipients,
            "show_personally": false,
        });

        if let Some(video_url) = &self.video_url {
            // The backend dedupes video posts by a digest of the URL.
            data["video_url"] = json!(video_url);
            data["md5"] = json!(format!("{:x}", md5::compute(video_url.as_bytes())));
        }

        if let Some(date_key) = self.streak_date_key {
            data["update_streak_for_yyyymmdd"] = json!(date_key);
        }

        json!({ "data": data })
    }
}

/// Creates a post on a chosen backend node.
#[async_trait]
pub trait PostClient: Send + Sync {
    async fn create_post(
        &self,
        node_address: &str,
        request: &PostRequest,
        bearer: &str,
    ) -> Result<(), PostError>;
}

pub struct HttpPostClient {
    client: reqwest::Client,
    post_path: String,
}

impl HttpPostClient {
    pub fn new(config: &NodesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.post_timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self {
            client,
            post_path: config.post_path.clone(),
        }
    }
}

#[async_trait]
impl PostClient for HttpPostClient {
    async fn create_post(
        &self,
        node_address: &str,
        request: &PostRequest,
        bearer: &str,
    ) -> Result<(), PostError> {
        let url = format!("{}{}", node_address, self.post_path);
        debug!(url = %url, "creating post");

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer)
            .json(&request.body())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            metrics::POSTS.with_label_values(&["unauthorized"]).inc();
            return Err(PostError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "post creation rejected");
            metrics::POSTS.with_label_values(&["failed"]).inc();
            return Err(PostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        metrics::POSTS.with_label_values(&["success"]).inc();
        info!(node = %node_address, "post created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PostRequest {
        PostRequest {
            thumbnail_url: "https://s.example/o/t.jpg?alt=media&token=tt".to_string(),
            video_url: None,
            caption: Some("hello".to_string()),
            overlays: vec![CaptionOverlay::Standard {
                text: "hello".to_string(),
            }],
            recipients: vec!["friend-1".to_string()],
            streak_date_key: None,
        }
    }

    #[test]
    fn test_image_post_body() {
        let body = request().body();
        let data = &body["data"];
        assert_eq!(data["thumbnail_url"], request().thumbnail_url);
        assert_eq!(data["caption"], "hello");
        assert_eq!(data["show_personally"], false);
        assert_eq!(data["recipients"][0], "friend-1");
        assert!(data.get("video_url").is_none());
        assert!(data.get("md5").is_none());
        assert!(data.get("update_streak_for_yyyymmdd").is_none());
    }

    #[test]
    fn test_video_post_carries_url_digest() {
        let mut req = request();
        let video_url = "https://s.example/o/v.mp4?alt=media&token=vv".to_string();
        req.video_url = Some(video_url.clone());

        let body = req.body();
        let data = &body["data"];
        assert_eq!(data["video_url"], video_url.as_str());
        assert_eq!(
            data["md5"],
            format!("{:x}", md5::compute(video_url.as_bytes()))
        );
    }

    #[test]
    fn test_streak_marker_uses_date_key() {
        let mut req = request();
        req.streak_date_key = Some(20260823);
        let body = req.body();
        assert_eq!(body["data"]["update_streak_for_yyyymmdd"], 20260823);
    }
}
