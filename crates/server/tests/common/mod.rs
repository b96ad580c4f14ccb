//! In-process test fixture with mock collaborators.
//!
//! Builds the real router on top of a real SQLite store and the mock
//! transcoder, storage, post and connectivity implementations, so API
//! tests exercise the full request path without external services.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use postpipe_core::testing::{
    MockConnectivityProbe, MockHealthProbe, MockPostClient, MockStorageClient, MockTokenRefresher,
    MockTranscoder,
};
use postpipe_core::{
    load_config_from_str, Clock, NodeSelector, QueueStore, SqliteQueueStore, SystemClock,
    TokenLifecycleManager, UploadProcessor,
};

use postpipe_server::api::create_router;
use postpipe_server::state::AppState;

pub const TEST_NODE: &str = "http://node-a.test";

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestFixture {
    pub router: Router,
    pub transcoder: Arc<MockTranscoder>,
    pub storage: Arc<MockStorageClient>,
    pub posts: Arc<MockPostClient>,
    pub connectivity: Arc<MockConnectivityProbe>,
    pub probe: Arc<MockHealthProbe>,
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let queue_dir = temp_dir.path().join("queue");

        let toml = format!(
            r#"
[auth]
refresh_url = "https://auth.test/token"
refresh_token = "rt-test"
user_id = "user-1"

[storage]
bucket = "media-bucket"

[nodes]
addresses = ["{TEST_NODE}"]

[database]
path = "{}"

[queue]
dir = "{}"
"#,
            db_path.display(),
            queue_dir.display(),
        );
        let config = load_config_from_str(&toml).expect("Failed to parse test config");

        let store: Arc<dyn QueueStore> = Arc::new(
            SqliteQueueStore::new(&db_path).expect("Failed to create queue store"),
        );

        let transcoder = Arc::new(MockTranscoder::new());
        let storage = Arc::new(MockStorageClient::new());
        let posts = Arc::new(MockPostClient::new());
        let connectivity = Arc::new(MockConnectivityProbe::online());
        let probe = Arc::new(MockHealthProbe::new());

        let selector = Arc::new(NodeSelector::new(config.nodes.clone(), probe.clone()));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let refresher = Arc::new(MockTokenRefresher::new());
        let tokens = Arc::new(TokenLifecycleManager::from_refresh_token(
            "rt-test",
            "user-1",
            refresher,
            Arc::clone(&clock),
        ));

        let processor = Arc::new(UploadProcessor::new(
            Arc::clone(&store),
            transcoder.clone(),
            storage.clone(),
            posts.clone(),
            connectivity.clone(),
            Arc::clone(&selector),
            tokens,
            clock,
            config.queue.clone(),
        ));

        let state = Arc::new(AppState::new(config, store, processor, selector));
        let router = create_router(state);

        Self {
            router,
            transcoder,
            storage,
            posts,
            connectivity,
            probe,
            temp_dir,
        }
    }

    /// Writes a source file the queue can take ownership of.
    pub fn write_source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, bytes).expect("Failed to write source file");
        path
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        TestResponse { status, body }
    }
}
