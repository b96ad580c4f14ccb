//! Core transcoder data types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extension of the prepared output for this kind.
    pub fn prepared_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    /// Content type of the prepared output for this kind.
    pub fn prepared_content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }
}

/// A request to normalize one captured file.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Identifier carried through progress updates.
    pub job_id: String,
    /// File to prepare. Consumed on success when stages rewrite it.
    pub input_path: PathBuf,
    /// Whether the file is an image or a video.
    pub kind: MediaKind,
}

/// Progress update emitted while a job runs.
#[derive(Debug, Clone)]
pub struct TranscodeProgress {
    pub job_id: String,
    /// Percent of the compression stage completed (0-100).
    pub percent: f32,
}

/// Result of preparing a file for upload.
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub job_id: String,
    /// Upload-ready file. Equals the input path when the file passed through.
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall time spent, in milliseconds.
    pub duration_ms: u64,
    /// True when the input was already under the target and left untouched.
    pub passed_through: bool,
}

/// Media file information reported by ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// Container format name (first of ffprobe's comma-separated list).
    pub format: String,
    pub video_codec: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
}

impl MediaInfo {
    /// Whether the container is already mp4-family.
    pub fn is_mp4(&self) -> bool {
        matches!(self.format.as_str(), "mov" | "mp4" | "m4a" | "3gp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_extensions() {
        assert_eq!(MediaKind::Image.prepared_extension(), "jpg");
        assert_eq!(MediaKind::Video.prepared_extension(), "mp4");
        assert_eq!(MediaKind::Video.prepared_content_type(), "video/mp4");
    }

    #[test]
    fn mp4_family_containers() {
        let mut info = MediaInfo {
            path: PathBuf::from("/x.mp4"),
            size_bytes: 1,
            duration_secs: 1.0,
            format: "mov".to_string(),
            video_codec: None,
            video_width: None,
            video_height: None,
        };
        assert!(info.is_mp4());
        info.format = "matroska".to_string();
        assert!(!info.is_mp4());
    }

    #[test]
    fn media_kind_serde_round_trip() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let kind: MediaKind = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(kind, MediaKind::Image);
    }
}
