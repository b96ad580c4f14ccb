//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Scratch directory for per-job intermediate files.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Timeout for a single ffmpeg invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Absolute ceiling for video inputs; anything larger is rejected.
    #[serde(default = "default_video_ceiling")]
    pub video_ceiling_bytes: u64,

    /// Target ceiling for uploaded video; inputs at or under pass through.
    #[serde(default = "default_video_target")]
    pub video_target_bytes: u64,

    /// Images under this size are uploaded as-is.
    #[serde(default = "default_image_target")]
    pub image_target_bytes: u64,

    /// Maximum image dimension for the first resize pass.
    #[serde(default = "default_image_dimension")]
    pub image_max_dimension: u32,

    /// Image dimension for the escalation pass.
    #[serde(default = "default_fallback_dimension")]
    pub image_fallback_dimension: u32,

    /// JPEG quality scale for the first resize pass (ffmpeg -q:v, lower is better).
    #[serde(default = "default_image_qscale")]
    pub image_qscale: u32,

    /// JPEG quality scale for the escalation pass.
    #[serde(default = "default_fallback_qscale")]
    pub image_fallback_qscale: u32,

    /// Constant rate factor for video compression.
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// Bitrate cap for video compression in kbps.
    #[serde(default = "default_maxrate")]
    pub maxrate_kbps: u32,

    /// Encoder preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Fixed encoder thread count.
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("postpipe-transcoder")
}

fn default_timeout() -> u64 {
    120
}

fn default_video_ceiling() -> u64 {
    25 * 1024 * 1024
}

fn default_video_target() -> u64 {
    5 * 1024 * 1024
}

fn default_image_target() -> u64 {
    1024 * 1024
}

fn default_image_dimension() -> u32 {
    1200
}

fn default_fallback_dimension() -> u32 {
    800
}

fn default_image_qscale() -> u32 {
    4
}

fn default_fallback_qscale() -> u32 {
    10
}

fn default_crf() -> u32 {
    28
}

fn default_maxrate() -> u32 {
    1200
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_threads() -> u32 {
    2
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            scratch_dir: default_scratch_dir(),
            timeout_secs: default_timeout(),
            video_ceiling_bytes: default_video_ceiling(),
            video_target_bytes: default_video_target(),
            image_target_bytes: default_image_target(),
            image_max_dimension: default_image_dimension(),
            image_fallback_dimension: default_fallback_dimension(),
            image_qscale: default_image_qscale(),
            image_fallback_qscale: default_fallback_qscale(),
            crf: default_crf(),
            maxrate_kbps: default_maxrate(),
            preset: default_preset(),
            threads: default_threads(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the scratch directory.
    pub fn with_scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
