use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::retry::RetryPolicy;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub nodes: NodesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("postpipe.db")
}

/// Credential refresh configuration.
///
/// Only the refresh-token exchange is covered here; acquiring the initial
/// refresh token (password login) happens outside this service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Token exchange endpoint.
    pub refresh_url: String,
    /// Long-lived refresh token used to mint bearer tokens.
    pub refresh_token: String,
    /// Account the uploads belong to.
    pub user_id: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_auth_timeout")]
    pub timeout_secs: u32,
}

fn default_auth_timeout() -> u32 {
    15
}

/// Object storage configuration for the resumable upload protocol.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage bucket holding the uploaded media objects.
    pub bucket: String,
    /// API base URL (default: the hosted storage endpoint).
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u32,
}

fn default_storage_base_url() -> String {
    "https://firebasestorage.googleapis.com/v0/b".to_string()
}

fn default_storage_timeout() -> u32 {
    120
}

/// Backend node pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodesConfig {
    /// Candidate backend node base URLs.
    pub addresses: Vec<String>,
    /// Maximum nodes kept in the active pool (default: 5)
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    /// Response time samples kept per node (default: 5)
    #[serde(default = "default_sample_window")]
    pub sample_window: usize,
    /// Seconds between health check cycles (default: 30)
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
    /// Probe timeout in seconds (default: 5)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u32,
    /// Path appended to the chosen node for post creation (default: "/posts")
    #[serde(default = "default_post_path")]
    pub post_path: String,
    /// Post request timeout in seconds (default: 30)
    #[serde(default = "default_post_timeout")]
    pub post_timeout_secs: u32,
    /// Scoring weights for best-node ranking.
    #[serde(default)]
    pub score: ScoreWeights,
}

fn default_max_active() -> usize {
    5
}

fn default_sample_window() -> usize {
    5
}

fn default_health_interval() -> u64 {
    30
}

fn default_probe_timeout() -> u32 {
    5
}

fn default_post_path() -> String {
    "/posts".to_string()
}

fn default_post_timeout() -> u32 {
    30
}

/// Weights for the node performance score.
///
/// Score = -mean_rt * response_time + free_ram_ratio * 100 * free_ram - cpu_usage * cpu.
/// Lower response time, more free RAM and less CPU load rank higher.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ScoreWeights {
    #[serde(default = "default_rt_weight")]
    pub response_time: f64,
    #[serde(default = "default_ram_weight")]
    pub free_ram: f64,
    #[serde(default = "default_cpu_weight")]
    pub cpu: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            response_time: default_rt_weight(),
            free_ram: default_ram_weight(),
            cpu: default_cpu_weight(),
        }
    }
}

fn default_rt_weight() -> f64 {
    1.0
}

fn default_ram_weight() -> f64 {
    1.0
}

fn default_cpu_weight() -> f64 {
    0.4
}

/// Upload queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Directory owning queued media files.
    #[serde(default = "default_queue_dir")]
    pub dir: PathBuf,
    /// Backoff applied between processing passes.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dir: default_queue_dir(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_queue_dir() -> PathBuf {
    PathBuf::from("queue")
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectivityConfig {
    /// URL probed to decide whether the device is online.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// Probe timeout in seconds (default: 5)
    #[serde(default = "default_connectivity_timeout")]
    pub timeout_secs: u32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            timeout_secs: default_connectivity_timeout(),
        }
    }
}

fn default_probe_url() -> String {
    "https://clients3.google.com/generate_204".to_string()
}

fn default_connectivity_timeout() -> u32 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub storage: StorageConfig,
    pub nodes: NodesConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub transcoder: TranscoderConfig,
    pub connectivity: ConnectivityConfig,
}

/// Sanitized auth config (refresh token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub refresh_url: String,
    pub refresh_token_configured: bool,
    pub user_id: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                refresh_url: config.auth.refresh_url.clone(),
                refresh_token_configured: !config.auth.refresh_token.is_empty(),
                user_id: config.auth.user_id.clone(),
                timeout_secs: config.auth.timeout_secs,
            },
            storage: config.storage.clone(),
            nodes: config.nodes.clone(),
            server: config.server.clone(),
            database: config.database.clone(),
            queue: config.queue.clone(),
            transcoder: config.transcoder.clone(),
            connectivity: config.connectivity.clone(),
        }
    }
}
