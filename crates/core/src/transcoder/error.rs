//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing media for upload.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input exceeds the absolute size ceiling.
    #[error("Input is {size_bytes} bytes, over the {ceiling_bytes} byte ceiling")]
    InputTooLarge { size_bytes: u64, ceiling_bytes: u64 },

    /// Compression finished but the output is still over the target ceiling.
    #[error("Output is {size_bytes} bytes, still over the {target_bytes} byte target")]
    StillOversized { size_bytes: u64, target_bytes: u64 },

    /// Transcode process failed.
    #[error("Transcode failed: {reason}")]
    TranscodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Transcode timed out.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error during transcoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a new transcode failed error with stderr output.
    pub fn transcode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::TranscodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable on a later pass.
    ///
    /// Size-ceiling violations and missing inputs never improve on retry;
    /// the owning queue item should be dropped.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_inputs_are_not_retryable() {
        let err = TranscodeError::InputTooLarge {
            size_bytes: 30 * 1024 * 1024,
            ceiling_bytes: 25 * 1024 * 1024,
        };
        assert!(!err.is_retryable());

        let err = TranscodeError::StillOversized {
            size_bytes: 6 * 1024 * 1024,
            target_bytes: 5 * 1024 * 1024,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeouts_are_retryable() {
        let err = TranscodeError::Timeout { timeout_secs: 120 };
        assert!(err.is_retryable());
    }
}
