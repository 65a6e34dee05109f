//! Editor configuration.

use std::path::PathBuf;
use std::time::Duration;

use vedit_models::encoding::DEFAULT_VIDEO_ENCODER;

/// Software encoder used when hardware acceleration is switched off.
pub const SOFTWARE_VIDEO_ENCODER: &str = "libx264";

/// Editor configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Directory for per-operation scratch files
    pub work_dir: PathBuf,
    /// Upper bound for one FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Maximum concurrent FFmpeg invocations across all requests
    pub max_concurrent_jobs: usize,
    /// Use CUDA decode/scale when the FFmpeg build supports it
    pub hwaccel: bool,
    /// Video encoder for every operation
    pub video_encoder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vedit"),
            ffmpeg_timeout: Duration::from_secs(1800), // 30 minutes
            max_concurrent_jobs: 2,
            hwaccel: true,
            video_encoder: DEFAULT_VIDEO_ENCODER.to_string(),
        }
    }
}

impl EditorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("EDITOR_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_timeout: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            max_concurrent_jobs: std::env::var("EDITOR_MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            hwaccel: std::env::var("EDITOR_HWACCEL")
                .ok()
                .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.hwaccel),
            video_encoder: std::env::var("EDITOR_VIDEO_ENCODER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.video_encoder),
        }
    }

    /// Encoder actually used; NVENC is swapped for x264 when acceleration is off.
    pub fn effective_encoder(&self) -> &str {
        if !self.hwaccel && self.video_encoder.ends_with("_nvenc") {
            SOFTWARE_VIDEO_ENCODER
        } else {
            &self.video_encoder
        }
    }
}
