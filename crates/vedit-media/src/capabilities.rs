//! Hardware acceleration detection.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::check_ffmpeg;

/// What the local FFmpeg build can accelerate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    /// `-hwaccel cuda` is listed
    pub cuda_decode: bool,
    /// The `scale_cuda` filter is compiled in
    pub scale_cuda: bool,
}

impl MediaCapabilities {
    /// Software-only pipeline.
    pub const fn software() -> Self {
        Self {
            cuda_decode: false,
            scale_cuda: false,
        }
    }

    /// Whether resize can keep frames on the GPU end to end.
    pub fn supports_hardware_scale(&self) -> bool {
        self.cuda_decode && self.scale_cuda
    }

    /// Input arguments for hardware decoding.
    ///
    /// `gpu_frames` keeps decoded frames in device memory. Only valid when
    /// every filter in the graph is a CUDA filter and the encoder is NVENC.
    pub fn decode_args(&self, gpu_frames: bool) -> Vec<String> {
        if !self.cuda_decode {
            return Vec::new();
        }
        let mut args = vec!["-hwaccel".to_string(), "cuda".to_string()];
        if gpu_frames {
            args.push("-hwaccel_output_format".to_string());
            args.push("cuda".to_string());
        }
        args
    }

    /// Query the installed FFmpeg. Missing binary or failed queries yield software mode.
    pub async fn detect() -> Self {
        let Ok(ffmpeg) = check_ffmpeg() else {
            debug!("FFmpeg not found, assuming software pipeline");
            return Self::software();
        };

        let hwaccels = query(&ffmpeg, "-hwaccels").await.unwrap_or_default();
        let filters = query(&ffmpeg, "-filters").await.unwrap_or_default();

        let caps = Self {
            cuda_decode: parse_hwaccels(&hwaccels),
            scale_cuda: parse_filters(&filters),
        };
        info!(
            cuda_decode = caps.cuda_decode,
            scale_cuda = caps.scale_cuda,
            "Detected FFmpeg capabilities"
        );
        caps
    }
}

async fn query(ffmpeg: &std::path::Path, flag: &str) -> Option<String> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_string())
}

/// `ffmpeg -hwaccels` prints a header followed by one method per line.
fn parse_hwaccels(output: &str) -> bool {
    output.lines().any(|line| line.trim() == "cuda")
}

/// `ffmpeg -filters` prints ` <flags> <name> <io> <description>` per filter.
fn parse_filters(output: &str) -> bool {
    output
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some("scale_cuda"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hwaccels() {
        let out = "Hardware acceleration methods:\nvdpau\ncuda\nvaapi\n";
        assert!(parse_hwaccels(out));
        assert!(!parse_hwaccels("Hardware acceleration methods:\nvaapi\n"));
        assert!(!parse_hwaccels(""));
    }

    #[test]
    fn test_parse_filters() {
        let out = " ... scale             V->V       Scale the input video size.\n \
                   ... scale_cuda        V->V       GPU accelerated video resizer\n";
        assert!(parse_filters(out));
        assert!(!parse_filters(" ... scale V->V Scale the input video size.\n"));
    }

    #[test]
    fn test_decode_args() {
        assert!(MediaCapabilities::software().decode_args(true).is_empty());

        let full = MediaCapabilities {
            cuda_decode: true,
            scale_cuda: true,
        };
        assert!(full.supports_hardware_scale());
        assert_eq!(full.decode_args(false), vec!["-hwaccel", "cuda"]);
        assert_eq!(
            full.decode_args(true),
            vec!["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"]
        );

        let decode_only = MediaCapabilities {
            cuda_decode: true,
            scale_cuda: false,
        };
        assert!(!decode_only.supports_hardware_scale());
        assert_eq!(decode_only.decode_args(false), vec!["-hwaccel", "cuda"]);
    }
}
