//! Per-operation validation and FFmpeg command construction.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use vedit_media::filters::{crop_filter, resize_filter, stacked_filter_complex, STACKED_OUTPUT_LABEL};
use vedit_media::{
    compose_stacked_layout, parse_resolution, validate_crop_bounds, FfmpegCommand,
    MediaCapabilities, MediaTool, Resolution,
};
use vedit_models::encoding::STACKED_ASPECT;
use vedit_models::{
    describe_validation_errors, EncodingProfile, OperationKind, OperationRequest, OutputFormat,
};

use crate::error::{EditError, EditResult};

/// Extension given to downloaded sources whose key has none.
const FALLBACK_INPUT_EXTENSION: &str = "bin";

/// Longest file name kept from an upload.
const MAX_UPLOAD_NAME_LEN: usize = 200;

/// Operation-specific parameters that survived validation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationParams {
    Cut { start: f64, end: f64 },
    Convert,
    Resize { target: Resolution },
    /// Bounds are checked against the probed source later
    Crop { x: i64, y: i64, width: i64, height: i64 },
    Merge,
}

/// A request that passed every check that needs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOperation {
    pub kind: OperationKind,
    /// Source keys in FFmpeg input order
    pub sources: Vec<String>,
    pub format: OutputFormat,
    pub params: OperationParams,
}

/// Validate a request without touching storage or spawning processes.
pub fn validate(request: &OperationRequest) -> EditResult<ValidatedOperation> {
    request
        .validate_shape()
        .map_err(|e| EditError::InvalidInput(describe_validation_errors(&e)))?;

    let (format, params) = match request {
        OperationRequest::Cut(r) => {
            if !r.start_time.is_finite() || !r.end_time.is_finite() {
                return Err(EditError::invalid_input("start_time and end_time must be finite"));
            }
            // Keep the source container unless told otherwise
            let format = match r.format.as_deref() {
                Some(f) => OutputFormat::parse(f)?,
                None => OutputFormat::from_key(&r.video_id).unwrap_or_default(),
            };
            (
                format,
                OperationParams::Cut {
                    start: r.start_time,
                    end: r.end_time,
                },
            )
        }
        OperationRequest::Convert(r) => (
            OutputFormat::parse_convertible(&r.target_format)?,
            OperationParams::Convert,
        ),
        OperationRequest::Resize(r) => (
            OutputFormat::parse_or_default(r.format.as_deref())?,
            OperationParams::Resize {
                target: parse_resolution(&r.resolution)?,
            },
        ),
        OperationRequest::Crop(r) => (
            OutputFormat::parse_or_default(r.format.as_deref())?,
            OperationParams::Crop {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            },
        ),
        OperationRequest::Merge(r) => (
            OutputFormat::parse_or_default(r.format.as_deref())?,
            OperationParams::Merge,
        ),
    };

    Ok(ValidatedOperation {
        kind: request.kind(),
        sources: request.source_keys().into_iter().map(str::to_string).collect(),
        format,
        params,
    })
}

/// Everything the command builder needs besides the operation itself.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    /// Downloaded sources, same order as [`ValidatedOperation::sources`]
    pub inputs: &'a [PathBuf],
    pub output: &'a Path,
    pub capabilities: MediaCapabilities,
    /// Resize may use `scale_cuda`
    pub hardware_scale: bool,
    pub video_encoder: &'a str,
}

/// Build the FFmpeg invocation, probing sources where geometry depends on them.
pub async fn build_command(
    op: &ValidatedOperation,
    ctx: &BuildContext<'_>,
    tool: &dyn MediaTool,
) -> EditResult<FfmpegCommand> {
    let main = input(ctx, 0)?;
    let standard = EncodingProfile::standard().with_codec(ctx.video_encoder);

    let cmd = match &op.params {
        OperationParams::Cut { start, end } => FfmpegCommand::new(main, ctx.output)
            .input_args(ctx.capabilities.decode_args(standard.is_nvenc()))
            .trim(*start, *end)
            .output_args(standard.to_ffmpeg_args()),

        OperationParams::Convert => FfmpegCommand::new(main, ctx.output)
            .input_args(ctx.capabilities.decode_args(standard.is_nvenc()))
            .output_args(standard.to_ffmpeg_args()),

        OperationParams::Resize { target } => {
            // scale_cuda emits device frames, which only NVENC can consume directly
            let hardware = ctx.hardware_scale && standard.is_nvenc();
            FfmpegCommand::new(main, ctx.output)
                .input_args(ctx.capabilities.decode_args(hardware))
                .video_filter(resize_filter(*target, hardware))
                .output_args(standard.to_ffmpeg_args())
        }

        OperationParams::Crop {
            x,
            y,
            width,
            height,
        } => {
            let source = tool.probe_resolution(main).await.map_err(EditError::probe)?;
            let region = validate_crop_bounds(*x, *y, *width, *height, source)?;
            FfmpegCommand::new(main, ctx.output)
                .input_args(ctx.capabilities.decode_args(false))
                .video_filter(crop_filter(region))
                .output_args(standard.to_ffmpeg_args())
        }

        OperationParams::Merge => {
            let background = input(ctx, 1)?;
            let main_res = tool.probe_resolution(main).await.map_err(EditError::probe)?;
            let background_res = tool
                .probe_resolution(background)
                .await
                .map_err(EditError::probe)?;
            let layout = compose_stacked_layout(main_res, background_res)?;
            let composite = EncodingProfile::composite().with_codec(ctx.video_encoder);

            // Software filter graph; the looped background never ends, so -shortest
            // stops at the end of the main video
            FfmpegCommand::new(main, ctx.output)
                .add_input(background)
                .loop_input()
                .filter_complex(stacked_filter_complex(&layout))
                .map(STACKED_OUTPUT_LABEL)
                .map("0:a?")
                .output_args(composite.to_ffmpeg_args())
                .aspect(STACKED_ASPECT)
                .shortest()
        }
    };

    Ok(cmd)
}

fn input<'a>(ctx: &BuildContext<'a>, index: usize) -> EditResult<&'a Path> {
    ctx.inputs
        .get(index)
        .map(PathBuf::as_path)
        .ok_or_else(|| EditError::internal(format!("missing input #{}", index)))
}

/// Extension used for a downloaded source's scratch file.
pub fn input_extension(key: &str) -> String {
    OutputFormat::from_key(key)
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_INPUT_EXTENSION.to_string())
}

/// Key of an operation result: `<operation id>.<format>`.
pub fn output_key(operation_id: &str, format: &OutputFormat) -> String {
    format!("{}.{}", operation_id, format)
}

/// Key of a direct upload: `<uuid>_<sanitized filename>`.
pub fn upload_key(filename: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(filename))
}

/// Reduce a client-supplied file name to a safe, flat object key suffix.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    let mut out: String = trimmed.chars().take(MAX_UPLOAD_NAME_LEN).collect();
    if out.is_empty() || out.chars().all(|c| c == '_') {
        out = "upload".to_string();
    }
    out
}
