//! The media tool seam.
//!
//! The editor only talks to FFmpeg through [`MediaTool`], so tests can swap
//! in a fake that writes output files without spawning processes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::capabilities::MediaCapabilities;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::geometry::Resolution;
use crate::probe::{probe_video, VideoInfo};

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Read stream metadata of a local file.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// What the tool can accelerate. Constant for the lifetime of the process.
    async fn capabilities(&self) -> MediaCapabilities;

    /// Run a command to completion; non-zero exit is an error.
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()>;

    /// Width and height of the first video stream.
    async fn probe_resolution(&self, path: &Path) -> MediaResult<Resolution> {
        let info = self.probe(path).await?;
        if info.width == 0 || info.height == 0 {
            return Err(MediaError::InvalidVideo(format!(
                "Video stream reports no dimensions: {}x{}",
                info.width, info.height
            )));
        }
        Ok(Resolution::new(info.width, info.height))
    }

    async fn supports_hardware_scale(&self) -> bool {
        self.capabilities().await.supports_hardware_scale()
    }
}

/// [`MediaTool`] backed by the local `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Default)]
pub struct FfmpegTool {
    runner: FfmpegRunner,
    capabilities: OnceCell<MediaCapabilities>,
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill invocations that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    /// Pin capabilities instead of detecting them (e.g. to force software mode).
    pub fn with_capabilities(self, capabilities: MediaCapabilities) -> Self {
        Self {
            runner: self.runner,
            capabilities: OnceCell::new_with(Some(capabilities)),
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn capabilities(&self) -> MediaCapabilities {
        *self
            .capabilities
            .get_or_init(MediaCapabilities::detect)
            .await
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.runner.run(cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(u32, u32);

    #[async_trait]
    impl MediaTool for FixedProbe {
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            Ok(VideoInfo {
                duration: 1.0,
                width: self.0,
                height: self.1,
                fps: 30.0,
                codec: "h264".to_string(),
                has_audio: false,
            })
        }

        async fn capabilities(&self) -> MediaCapabilities {
            MediaCapabilities::software()
        }

        async fn run(&self, _cmd: &FfmpegCommand) -> MediaResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_probe_resolution_rejects_zero_dimensions() {
        let ok = FixedProbe(1280, 720)
            .probe_resolution(Path::new("x.mp4"))
            .await
            .unwrap();
        assert_eq!(ok, Resolution::new(1280, 720));

        let err = FixedProbe(0, 720)
            .probe_resolution(Path::new("x.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[tokio::test]
    async fn test_pinned_capabilities_skip_detection() {
        let tool = FfmpegTool::new().with_capabilities(MediaCapabilities::software());
        assert_eq!(tool.capabilities().await, MediaCapabilities::software());
        assert!(!tool.supports_hardware_scale().await);
    }
}
