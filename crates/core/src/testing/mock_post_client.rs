//! Mock post-creation client.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::uploader::{PostClient, PostError, PostRequest};

/// A recorded post-creation call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub node_address: String,
    pub request: PostRequest,
    pub bearer: String,
}

/// Post client that records every call, including the rejected ones.
pub struct MockPostClient {
    posts: Arc<RwLock<Vec<RecordedPost>>>,
    next_error: Arc<RwLock<Option<PostError>>>,
}

impl Default for MockPostClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPostClient {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Fail the next call with this error, once.
    pub async fn fail_next(&self, error: PostError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.posts.read().await.clone()
    }
}

#[async_trait]
impl PostClient for MockPostClient {
    async fn create_post(
        &self,
        node_address: &str,
        request: &PostRequest,
        bearer: &str,
    ) -> Result<(), PostError> {
        self.posts.write().await.push(RecordedPost {
            node_address: node_address.to_string(),
            request: request.clone(),
            bearer: bearer.to_string(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(())
    }
}
