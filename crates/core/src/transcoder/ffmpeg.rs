//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{MediaInfo, MediaKind, TranscodeJob, TranscodeProgress, TranscodeResult};

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments for the square-crop stage.
    ///
    /// Crops to the centered square of the shorter edge and drops the
    /// audio track.
    fn build_crop_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            "crop='min(iw,ih)':'min(iw,ih)'".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-threads".to_string(),
            self.config.threads.to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for the bounded-bitrate compression stage.
    fn build_compress_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let maxrate = format!("{}k", self.config.maxrate_kbps);
        let bufsize = format!("{}k", self.config.maxrate_kbps * 2);
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-maxrate".to_string(),
            maxrate,
            "-bufsize".to_string(),
            bufsize,
            "-preset".to_string(),
            self.config.preset.clone(),
            "-threads".to_string(),
            self.config.threads.to_string(),
            "-an".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for the container remux stage (stream copy).
    fn build_remux_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for an image resize pass.
    fn build_image_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        max_dimension: u32,
        qscale: u32,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!(
                "scale='min({0},iw)':'min({0},ih)':force_original_aspect_ratio=decrease",
                max_dimension
            ),
            "-q:v".to_string(),
            qscale.to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for thumbnail extraction at `seek_secs`.
    fn build_thumbnail_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        seek_secs: f64,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{:.3}", seek_secs),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "3".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, TranscodeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| TranscodeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
        })
    }

    /// Runs one ffmpeg invocation with optional progress reporting.
    async fn run_ffmpeg(
        &self,
        args: &[String],
        job_id: &str,
        duration_secs: Option<f64>,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<(), TranscodeError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_send = Instant::now();
            let progress_interval = Duration::from_millis(500);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                if let (Some(re), Some(tx)) = (&time_regex, progress_tx) {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(ms_str) = caps.get(1) {
                            if let Ok(us) = ms_str.as_str().parse::<f64>() {
                                let current_time = us / 1_000_000.0;
                                if last_progress_send.elapsed() >= progress_interval {
                                    let percent = match duration_secs {
                                        Some(dur) if dur > 0.0 => {
                                            (current_time / dur * 100.0).min(100.0) as f32
                                        }
                                        _ => 0.0,
                                    };
                                    // Non-blocking send
                                    let _ = tx.try_send(TranscodeProgress {
                                        job_id: job_id.to_string(),
                                        percent,
                                    });
                                    last_progress_send = Instant::now();
                                }
                            }
                        }
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(TranscodeError::transcode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(TranscodeError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }

    async fn file_size(path: &Path) -> Result<u64, TranscodeError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TranscodeError::InputNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(TranscodeError::Io(e)),
        }
    }

    /// Moves a file, falling back to copy + remove across filesystems.
    async fn move_file(from: &Path, to: &Path) -> Result<(), TranscodeError> {
        if tokio::fs::rename(from, to).await.is_ok() {
            return Ok(());
        }
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
        Ok(())
    }

    /// Upload-ready sibling path for the prepared output.
    fn prepared_path(input_path: &Path, kind: MediaKind) -> PathBuf {
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("media");
        let file_name = format!("{}.prepared.{}", stem, kind.prepared_extension());
        match input_path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    async fn prepare_video(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeResult, TranscodeError> {
        let start = Instant::now();
        let input_size = Self::file_size(&job.input_path).await?;

        if input_size > self.config.video_ceiling_bytes {
            return Err(TranscodeError::InputTooLarge {
                size_bytes: input_size,
                ceiling_bytes: self.config.video_ceiling_bytes,
            });
        }

        if input_size <= self.config.video_target_bytes {
            debug!(job_id = %job.job_id, size = input_size, "video under target, passing through");
            return Ok(TranscodeResult {
                job_id: job.job_id.clone(),
                output_path: job.input_path.clone(),
                output_size_bytes: input_size,
                duration_ms: start.elapsed().as_millis() as u64,
                passed_through: true,
            });
        }

        let duration_secs = self.probe(&job.input_path).await.ok().map(|i| i.duration_secs);

        // Intermediates keep the input container; the remux stage moves the
        // final stream into mp4 when they differ.
        let input_ext = job
            .input_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_lowercase();

        let scratch = self.config.scratch_dir.join(&job.job_id);
        tokio::fs::create_dir_all(&scratch).await?;

        let result = self
            .run_video_stages(job, &scratch, &input_ext, duration_secs, progress_tx)
            .await;

        // Scratch intermediates are removed on every outcome.
        let _ = tokio::fs::remove_dir_all(&scratch).await;

        let (output_path, output_size) = result?;

        Ok(TranscodeResult {
            job_id: job.job_id.clone(),
            output_path,
            output_size_bytes: output_size,
            duration_ms: start.elapsed().as_millis() as u64,
            passed_through: false,
        })
    }

    async fn run_video_stages(
        &self,
        job: &TranscodeJob,
        scratch: &Path,
        input_ext: &str,
        duration_secs: Option<f64>,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<(PathBuf, u64), TranscodeError> {
        // Stage 1: center square crop, audio stripped. The input stays
        // in place until the whole pipeline succeeds, so a failed stage
        // leaves the item retryable.
        let cropped = scratch.join(format!("cropped.{}", input_ext));
        let args = self.build_crop_args(&job.input_path, &cropped);
        self.run_ffmpeg(&args, &job.job_id, None, None).await?;

        // Stage 2: single-pass bounded-bitrate compression.
        let compressed = scratch.join(format!("compressed.{}", input_ext));
        let args = self.build_compress_args(&cropped, &compressed);
        self.run_ffmpeg(&args, &job.job_id, duration_secs, progress_tx)
            .await?;
        tokio::fs::remove_file(&cropped).await?;

        let compressed_size = Self::file_size(&compressed).await?;
        if compressed_size > self.config.video_target_bytes {
            return Err(TranscodeError::StillOversized {
                size_bytes: compressed_size,
                target_bytes: self.config.video_target_bytes,
            });
        }

        // Stage 3: remux into mp4 when the container differs.
        let final_in_scratch = if input_ext == "mp4" {
            compressed
        } else {
            let remuxed = scratch.join("remuxed.mp4");
            let args = self.build_remux_args(&compressed, &remuxed);
            self.run_ffmpeg(&args, &job.job_id, None, None).await?;
            tokio::fs::remove_file(&compressed).await?;
            remuxed
        };

        let output_path = Self::prepared_path(&job.input_path, MediaKind::Video);
        Self::move_file(&final_in_scratch, &output_path).await?;
        tokio::fs::remove_file(&job.input_path).await?;
        let output_size = Self::file_size(&output_path).await?;

        Ok((output_path, output_size))
    }

    async fn prepare_image(&self, job: &TranscodeJob) -> Result<TranscodeResult, TranscodeError> {
        let start = Instant::now();
        let input_size = Self::file_size(&job.input_path).await?;

        if input_size < self.config.image_target_bytes {
            debug!(job_id = %job.job_id, size = input_size, "image under target, passing through");
            return Ok(TranscodeResult {
                job_id: job.job_id.clone(),
                output_path: job.input_path.clone(),
                output_size_bytes: input_size,
                duration_ms: start.elapsed().as_millis() as u64,
                passed_through: true,
            });
        }

        let scratch = self.config.scratch_dir.join(&job.job_id);
        tokio::fs::create_dir_all(&scratch).await?;

        let result = self.run_image_passes(job, &scratch).await;

        let _ = tokio::fs::remove_dir_all(&scratch).await;

        let (output_path, output_size) = result?;

        Ok(TranscodeResult {
            job_id: job.job_id.clone(),
            output_path,
            output_size_bytes: output_size,
            duration_ms: start.elapsed().as_millis() as u64,
            passed_through: false,
        })
    }

    async fn run_image_passes(
        &self,
        job: &TranscodeJob,
        scratch: &Path,
    ) -> Result<(PathBuf, u64), TranscodeError> {
        let first = scratch.join("resized.jpg");
        let args = self.build_image_args(
            &job.input_path,
            &first,
            self.config.image_max_dimension,
            self.config.image_qscale,
        );
        self.run_ffmpeg(&args, &job.job_id, None, None).await?;

        let mut chosen = first;
        if Self::file_size(&chosen).await? >= self.config.image_target_bytes {
            // One escalation to a smaller dimension and lower quality,
            // resizing from the original input.
            let second = scratch.join("resized-small.jpg");
            let args = self.build_image_args(
                &job.input_path,
                &second,
                self.config.image_fallback_dimension,
                self.config.image_fallback_qscale,
            );
            self.run_ffmpeg(&args, &job.job_id, None, None).await?;
            chosen = second;
        }

        let output_path = Self::prepared_path(&job.input_path, MediaKind::Image);
        Self::move_file(&chosen, &output_path).await?;
        tokio::fs::remove_file(&job.input_path).await?;
        let output_size = Self::file_size(&output_path).await?;

        Ok((output_path, output_size))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn prepare(&self, job: TranscodeJob) -> Result<TranscodeResult, TranscodeError> {
        match job.kind {
            MediaKind::Video => self.prepare_video(&job, None).await,
            MediaKind::Image => self.prepare_image(&job).await,
        }
    }

    async fn prepare_with_progress(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeResult, TranscodeError> {
        match job.kind {
            MediaKind::Video => self.prepare_video(&job, Some(&progress_tx)).await,
            MediaKind::Image => self.prepare_image(&job).await,
        }
    }

    async fn extract_thumbnail(&self, video_path: &Path) -> Result<PathBuf, TranscodeError> {
        let info = self.probe(video_path).await?;
        let seek_secs = (info.duration_secs / 2.0).max(0.0);

        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;
        let output = self
            .config
            .scratch_dir
            .join(format!("thumb-{}.jpg", uuid::Uuid::new_v4()));

        let args = self.build_thumbnail_args(video_path, &output, seek_secs);
        self.run_ffmpeg(&args, "thumbnail", None, None).await?;

        Ok(output)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        // Ensure scratch dir exists
        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_crop_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_crop_args(Path::new("/in.mov"), Path::new("/out.mov"));

        assert!(args.contains(&"-vf".to_string()));
        assert!(args.contains(&"crop='min(iw,ih)':'min(iw,ih)'".to_string()));
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"libx264".to_string()));
    }

    #[test]
    fn test_build_compress_args() {
        let mut config = TranscoderConfig::default();
        config.crf = 26;
        config.maxrate_kbps = 1000;
        let transcoder = FfmpegTranscoder::new(config);

        let args = transcoder.build_compress_args(Path::new("/in.mov"), Path::new("/out.mov"));

        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"26".to_string()));
        assert!(args.contains(&"-maxrate".to_string()));
        assert!(args.contains(&"1000k".to_string()));
        assert!(args.contains(&"-bufsize".to_string()));
        assert!(args.contains(&"2000k".to_string()));
        // Compression is a single pass with progress on stderr
        assert!(args.contains(&"-progress".to_string()));
    }

    #[test]
    fn test_build_remux_args_stream_copies() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_remux_args(Path::new("/in.mov"), Path::new("/out.mp4"));

        assert!(args.contains(&"-c".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert!(!args.contains(&"libx264".to_string()));
    }

    #[test]
    fn test_build_image_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args =
            transcoder.build_image_args(Path::new("/in.png"), Path::new("/out.jpg"), 1200, 4);

        assert!(args
            .iter()
            .any(|a| a.contains("min(1200,iw)") && a.contains("force_original_aspect_ratio")));
        assert!(args.contains(&"-q:v".to_string()));
        assert!(args.contains(&"4".to_string()));
    }

    #[test]
    fn test_build_thumbnail_args_seeks_midpoint() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args =
            transcoder.build_thumbnail_args(Path::new("/in.mp4"), Path::new("/thumb.jpg"), 4.5);

        assert!(args.contains(&"-ss".to_string()));
        assert!(args.contains(&"4.500".to_string()));
        assert!(args.contains(&"-frames:v".to_string()));
    }

    #[test]
    fn test_prepared_path() {
        let path = FfmpegTranscoder::prepared_path(Path::new("/queue/abc.mov"), MediaKind::Video);
        assert_eq!(path, PathBuf::from("/queue/abc.prepared.mp4"));

        let path = FfmpegTranscoder::prepared_path(Path::new("/queue/abc.png"), MediaKind::Image);
        assert_eq!(path, PathBuf::from("/queue/abc.prepared.jpg"));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": {
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "9.0",
                "size": "12582912"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1080,
                    "height": 1920
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegTranscoder::parse_probe_output(Path::new("clip.mov"), json).unwrap();
        assert_eq!(info.format, "mov");
        assert!(info.is_mp4());
        assert!((info.duration_secs - 9.0).abs() < 0.01);
        assert_eq!(info.size_bytes, 12582912);
        assert_eq!(info.video_codec, Some("h264".to_string()));
        assert_eq!(info.video_width, Some(1080));
        assert_eq!(info.video_height, Some(1920));
    }

    #[test]
    fn test_parse_probe_output_invalid_json() {
        let result = FfmpegTranscoder::parse_probe_output(Path::new("x"), "not json");
        assert!(matches!(result, Err(TranscodeError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_video_over_ceiling_rejected_without_running_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mov");
        tokio::fs::write(&input, vec![0u8; 2048]).await.unwrap();

        let mut config = TranscoderConfig::default();
        config.video_ceiling_bytes = 1024;
        config.ffmpeg_path = PathBuf::from("/nonexistent/ffmpeg");
        let transcoder = FfmpegTranscoder::new(config);

        let job = TranscodeJob {
            job_id: "j1".to_string(),
            input_path: input.clone(),
            kind: MediaKind::Video,
        };

        let err = transcoder.prepare(job).await.unwrap_err();
        assert!(matches!(err, TranscodeError::InputTooLarge { .. }));
        // Rejection never consumes the input
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_video_under_target_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        tokio::fs::write(&input, vec![0u8; 512]).await.unwrap();

        let mut config = TranscoderConfig::default();
        config.video_target_bytes = 1024;
        config.ffmpeg_path = PathBuf::from("/nonexistent/ffmpeg");
        let transcoder = FfmpegTranscoder::new(config);

        let job = TranscodeJob {
            job_id: "j2".to_string(),
            input_path: input.clone(),
            kind: MediaKind::Video,
        };

        let result = transcoder.prepare(job).await.unwrap();
        assert!(result.passed_through);
        assert_eq!(result.output_path, input);
        assert_eq!(result.output_size_bytes, 512);
    }

    #[tokio::test]
    async fn test_failed_stage_leaves_input_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mov");
        tokio::fs::write(&input, vec![0u8; 2048]).await.unwrap();

        let mut config = TranscoderConfig::default();
        config.video_target_bytes = 1024;
        config.scratch_dir = dir.path().join("scratch");
        config.ffmpeg_path = PathBuf::from("/nonexistent/ffmpeg");
        config.ffprobe_path = PathBuf::from("/nonexistent/ffprobe");
        let transcoder = FfmpegTranscoder::new(config);

        let job = TranscodeJob {
            job_id: "j5".to_string(),
            input_path: input.clone(),
            kind: MediaKind::Video,
        };

        let result = transcoder.prepare(job).await;
        assert!(result.is_err());
        // A queued item must still point at a real file for its retry.
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_image_under_target_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.jpg");
        tokio::fs::write(&input, vec![0u8; 100]).await.unwrap();

        let transcoder = FfmpegTranscoder::with_defaults();
        let job = TranscodeJob {
            job_id: "j3".to_string(),
            input_path: input.clone(),
            kind: MediaKind::Image,
        };

        let result = transcoder.prepare(job).await.unwrap();
        assert!(result.passed_through);
        assert_eq!(result.output_path, input);
    }

    #[tokio::test]
    async fn test_missing_input_reported() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let job = TranscodeJob {
            job_id: "j4".to_string(),
            input_path: PathBuf::from("/nonexistent/clip.mp4"),
            kind: MediaKind::Video,
        };

        let err = transcoder.prepare(job).await.unwrap_err();
        assert!(matches!(err, TranscodeError::InputNotFound { .. }));
    }
}
