//! Transcoder module for normalizing captured media before upload.
//!
//! This module provides the `Transcoder` trait and an FFmpeg-backed
//! implementation that brings captured video and images under the plan
//! size ceilings.
//!
//! Video goes through up to three stages: square crop with the audio
//! track stripped, single-pass bounded-bitrate compression, and an mp4
//! remux when the container differs. Inputs already at or under the
//! target ceiling pass through untouched; inputs over the absolute
//! ceiling are rejected outright. Images are resized to a bounded
//! dimension, with a single escalation to a smaller dimension and lower
//! quality when the first pass is still oversized.
//!
//! # Example
//!
//! ```ignore
//! use postpipe_core::transcoder::{FfmpegTranscoder, Transcoder, TranscodeJob, MediaKind};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let job = TranscodeJob {
//!     job_id: "job-1".to_string(),
//!     input_path: PathBuf::from("/queue/clip.mov"),
//!     kind: MediaKind::Video,
//! };
//!
//! let result = transcoder.prepare(job).await?;
//! println!("Ready for upload: {:?} ({} bytes)", result.output_path, result.output_size_bytes);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{MediaInfo, MediaKind, TranscodeJob, TranscodeProgress, TranscodeResult};
