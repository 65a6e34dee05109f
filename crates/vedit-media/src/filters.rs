//! FFmpeg video filter expressions.

use crate::geometry::{CompositeLayout, CoverScale, CropRegion, Resolution};

/// Output label of the stacked composite graph.
pub const STACKED_OUTPUT_LABEL: &str = "[vout]";

/// Fit inside `target`, preserving aspect ratio and never upscaling past the box.
///
/// `hardware` selects the CUDA scaler; parameters are identical on both paths.
pub fn resize_filter(target: Resolution, hardware: bool) -> String {
    let name = if hardware { "scale_cuda" } else { "scale" };
    format!(
        "{}={}:{}:force_original_aspect_ratio=decrease",
        name, target.width, target.height
    )
}

/// Absolute pixel crop.
///
/// FFmpeg has no CUDA crop filter, so crop always runs on system-memory frames.
pub fn crop_filter(region: CropRegion) -> String {
    format!(
        "crop={}:{}:{}:{}",
        region.width, region.height, region.x, region.y
    )
}

/// Scale-to-cover followed by a centered crop.
pub fn cover_filter(plan: &CoverScale) -> String {
    format!(
        "scale={}:{},crop={}:{}:{}:{}",
        plan.scaled.width,
        plan.scaled.height,
        plan.target.width,
        plan.target.height,
        plan.crop_x,
        plan.crop_y
    )
}

/// Filter graph stacking input 0 (top) over input 1 (bottom) into [`STACKED_OUTPUT_LABEL`].
pub fn stacked_filter_complex(layout: &CompositeLayout) -> String {
    format!(
        "[0:v]{}[top];[1:v]{}[bottom];[top][bottom]vstack=inputs=2{}",
        cover_filter(&layout.top),
        cover_filter(&layout.bottom),
        STACKED_OUTPUT_LABEL
    )
}
