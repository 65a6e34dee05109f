#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for video editing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building (multiple inputs, filter graphs)
//! - A runner with timeouts, stderr capture and kill-on-drop cancellation
//! - FFprobe metadata extraction
//! - Hardware capability detection (CUDA decode, `scale_cuda`)
//! - Pure geometry for resize, crop and the stacked 9:16 composite
//! - The [`MediaTool`] seam the editor drives, so tests never spawn processes

pub mod capabilities;
pub mod command;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod probe;
pub mod tool;

pub use capabilities::MediaCapabilities;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use geometry::{
    compose_stacked_layout, parse_resolution, scale_to_cover, validate_crop_bounds,
    CompositeLayout, CoverScale, CropRegion, GeometryError, Resolution,
};
pub use probe::{probe_video, VideoInfo};
pub use tool::{FfmpegTool, MediaTool};
