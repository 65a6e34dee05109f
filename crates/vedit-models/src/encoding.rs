//! Video encoding profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video encoder (NVIDIA hardware H.264)
pub const DEFAULT_VIDEO_ENCODER: &str = "h264_nvenc";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Preset for cut/convert/resize/crop
pub const STANDARD_PRESET: &str = "p4";
/// Constant bitrate target for cut/convert/resize/crop
pub const STANDARD_VIDEO_BITRATE: &str = "5M";
/// Audio bitrate for cut/convert/resize/crop
pub const STANDARD_AUDIO_BITRATE: &str = "128k";

/// Preset for stacked composites (fastest NVENC preset)
pub const COMPOSITE_PRESET: &str = "p1";
/// Constant quality target for stacked composites
pub const COMPOSITE_CQ: u8 = 22;
/// Audio bitrate for stacked composites
pub const COMPOSITE_AUDIO_BITRATE: &str = "192k";
/// Pixel format forced on stacked composites
pub const COMPOSITE_PIXEL_FORMAT: &str = "yuv420p";

/// Stacked composite canvas (portrait 9:16)
pub const STACKED_CANVAS_WIDTH: u32 = 1080;
pub const STACKED_CANVAS_HEIGHT: u32 = 1920;
pub const STACKED_ASPECT: &str = "9:16";

/// How the video encoder is told to spend bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RateControl {
    /// Target bitrate, e.g. "5M"
    Bitrate(String),
    /// Constant quality factor (`-cq` on NVENC, `-crf` elsewhere)
    ConstantQuality(u8),
}

/// Video + audio encoding profile for one operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingProfile {
    /// Video codec (e.g., "h264_nvenc", "libx264")
    pub codec: String,
    /// Encoder preset
    pub preset: String,
    pub rate_control: RateControl,
    /// Audio codec
    pub audio_codec: String,
    /// Audio bitrate
    pub audio_bitrate: String,
    /// Output pixel format, if forced
    #[serde(default)]
    pub pixel_format: Option<String>,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self::standard()
    }
}

impl EncodingProfile {
    /// Constant-bitrate profile used by cut, convert, resize and crop.
    pub fn standard() -> Self {
        Self {
            codec: DEFAULT_VIDEO_ENCODER.to_string(),
            preset: STANDARD_PRESET.to_string(),
            rate_control: RateControl::Bitrate(STANDARD_VIDEO_BITRATE.to_string()),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: STANDARD_AUDIO_BITRATE.to_string(),
            pixel_format: None,
        }
    }

    /// Quality-factor profile with the fastest preset, used for stacked composites.
    pub fn composite() -> Self {
        Self {
            codec: DEFAULT_VIDEO_ENCODER.to_string(),
            preset: COMPOSITE_PRESET.to_string(),
            rate_control: RateControl::ConstantQuality(COMPOSITE_CQ),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: COMPOSITE_AUDIO_BITRATE.to_string(),
            pixel_format: Some(COMPOSITE_PIXEL_FORMAT.to_string()),
        }
    }

    /// Swap the video encoder.
    ///
    /// NVENC presets (`p1`..`p7`) have no meaning for software encoders, so
    /// they are translated to the closest x264-style preset name.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        if !self.is_nvenc() {
            self.preset = software_preset(&self.preset).to_string();
        }
        self
    }

    /// Whether the video encoder is an NVENC encoder.
    pub fn is_nvenc(&self) -> bool {
        self.codec.ends_with("_nvenc")
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];

        match &self.rate_control {
            RateControl::Bitrate(bitrate) => {
                args.extend_from_slice(&["-b:v".to_string(), bitrate.clone()]);
            }
            // CRF is not used with NVENC, use -cq instead
            RateControl::ConstantQuality(q) if self.is_nvenc() => {
                args.extend_from_slice(&["-cq".to_string(), q.to_string()]);
            }
            RateControl::ConstantQuality(q) => {
                args.extend_from_slice(&["-crf".to_string(), q.to_string()]);
            }
        }

        if let Some(pix_fmt) = &self.pixel_format {
            args.extend_from_slice(&["-pix_fmt".to_string(), pix_fmt.clone()]);
        }

        args.extend_from_slice(&[
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]);

        args
    }
}

fn software_preset(nvenc_preset: &str) -> &str {
    match nvenc_preset {
        "p1" => "ultrafast",
        "p2" => "superfast",
        "p3" => "veryfast",
        "p4" => "medium",
        "p5" => "slow",
        "p6" => "slower",
        "p7" => "veryslow",
        other => other,
    }
}
