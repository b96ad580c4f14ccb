pub mod config;
pub mod connectivity;
pub mod metrics;
pub mod nodes;
pub mod queue;
pub mod retry;
pub mod testing;
pub mod token;
pub mod transcoder;
pub mod uploader;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use connectivity::{ConnectivityProbe, HttpConnectivityProbe};
pub use nodes::{HealthProbe, HttpHealthProbe, NodeError, NodeSelector};
pub use queue::{
    EnqueueRequest, ProcessOutcome, ProgressListener, QueueError, QueueStore, SqliteQueueStore,
    UploadProcessor,
};
pub use retry::RetryPolicy;
pub use token::{
    Clock, HttpTokenRefresher, SystemClock, TokenError, TokenLifecycleManager, TokenRefresher,
};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
pub use uploader::{
    HttpPostClient, PostClient, PostError, ResumableStorageClient, StorageClient, UploadError,
};
