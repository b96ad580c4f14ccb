use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postpipe_core::{
    load_config, validate_config, Clock, ConnectivityProbe, FfmpegTranscoder, HttpConnectivityProbe,
    HttpHealthProbe, HttpPostClient, HttpTokenRefresher, NodeSelector, PostClient, QueueStore,
    ResumableStorageClient, SqliteQueueStore, StorageClient, SystemClock, TokenLifecycleManager,
    TokenRefresher, Transcoder, UploadProcessor,
};

use postpipe_server::api::create_router;
use postpipe_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("POSTPIPE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Queue directory: {:?}", config.queue.dir);
    info!("Configured nodes: {}", config.nodes.addresses.len());

    // Create SQLite queue store
    let store: Arc<dyn QueueStore> = Arc::new(
        SqliteQueueStore::new(&config.database.path).context("Failed to create queue store")?,
    );
    info!("Queue store initialized");

    // The queue directory must exist before the first enqueue
    std::fs::create_dir_all(&config.queue.dir)
        .with_context(|| format!("Failed to create queue directory {:?}", config.queue.dir))?;

    // Create the transcoder and check that ffmpeg is actually runnable
    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    transcoder
        .validate()
        .await
        .context("Transcoder validation failed (is ffmpeg installed?)")?;
    info!("Transcoder validated: {}", transcoder.name());

    // Storage and post clients
    let storage: Arc<dyn StorageClient> =
        Arc::new(ResumableStorageClient::new(config.storage.clone()));
    let posts: Arc<dyn PostClient> = Arc::new(HttpPostClient::new(&config.nodes));
    info!("Storage bucket: {}", config.storage.bucket);

    // Connectivity probe
    let connectivity: Arc<dyn ConnectivityProbe> =
        Arc::new(HttpConnectivityProbe::new(config.connectivity.clone()));

    // Node selector with its background health check loop
    let health_probe = Arc::new(HttpHealthProbe::new(&config.nodes));
    let selector = Arc::new(NodeSelector::new(config.nodes.clone(), health_probe));
    let selector_task = tokio::spawn(Arc::clone(&selector).run());
    info!("Node selector started");

    // Token lifecycle manager; the first upload mints the bearer
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let refresher: Arc<dyn TokenRefresher> = Arc::new(HttpTokenRefresher::new(config.auth.clone()));
    let tokens = Arc::new(TokenLifecycleManager::from_refresh_token(
        config.auth.refresh_token.clone(),
        config.auth.user_id.clone(),
        refresher,
        Arc::clone(&clock),
    ));

    // Upload processor
    let processor = Arc::new(UploadProcessor::new(
        Arc::clone(&store),
        transcoder,
        storage,
        posts,
        connectivity,
        Arc::clone(&selector),
        tokens,
        clock,
        config.queue.clone(),
    ));
    info!("Upload processor initialized");

    // Create app state
    let app_state = Arc::new(AppState::new(
        config.clone(),
        store,
        processor,
        Arc::clone(&selector),
    ));

    // Create router
    let app = create_router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    selector_task.abort();
    info!("Node selector stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
