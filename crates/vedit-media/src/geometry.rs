//! Frame geometry for resize, crop and the stacked composite.
//!
//! Everything here is pure arithmetic on pixel sizes. Filter strings are
//! produced from these results in [`crate::filters`].

use std::fmt;

use thiserror::Error;
use vedit_models::encoding::{STACKED_CANVAS_HEIGHT, STACKED_CANVAS_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Invalid resolution '{0}': expected <width>x<height> with positive integers")]
    InvalidResolution(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error(
        "Crop region {width}x{height} at ({x},{y}) exceeds source frame {source_width}x{source_height}"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        source_width: u32,
        source_height: u32,
    },
}

/// A frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parse `<width>x<height>` (the separator is case-insensitive).
pub fn parse_resolution(s: &str) -> Result<Resolution, GeometryError> {
    let invalid = || GeometryError::InvalidResolution(s.to_string());

    let lowered = s.trim().to_ascii_lowercase();
    let mut parts = lowered.split('x');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok(Resolution::new(width, height))
}

/// A crop rectangle known to lie inside its source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Check that `(x, y, width, height)` fits inside `source`.
pub fn validate_crop_bounds(
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    source: Resolution,
) -> Result<CropRegion, GeometryError> {
    let fits = x >= 0
        && y >= 0
        && width > 0
        && height > 0
        && x
            .checked_add(width)
            .zip(y.checked_add(height))
            .is_some_and(|(right, bottom)| {
                right <= source.width as i64 && bottom <= source.height as i64
            });

    if !fits {
        return Err(GeometryError::OutOfBounds {
            x,
            y,
            width,
            height,
            source_width: source.width,
            source_height: source.height,
        });
    }

    // Every value is bounded by the u32 source size at this point
    Ok(CropRegion {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Scale-then-center-crop plan that fills a target box without distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverScale {
    /// Size after uniform scaling; covers the target in both dimensions
    pub scaled: Resolution,
    /// Target box the scaled frame is cropped to
    pub target: Resolution,
    /// Horizontal crop offset (centered)
    pub crop_x: u32,
    /// Vertical crop offset (centered)
    pub crop_y: u32,
}

/// Uniformly scale `source` so it covers `target`, then center the crop.
pub fn scale_to_cover(source: Resolution, target: Resolution) -> Result<CoverScale, GeometryError> {
    if source.width == 0 || source.height == 0 {
        return Err(GeometryError::InvalidGeometry(format!(
            "source frame has no area: {}",
            source
        )));
    }
    if target.width == 0 || target.height == 0 {
        return Err(GeometryError::InvalidGeometry(format!(
            "target box has no area: {}",
            target
        )));
    }

    let sx = target.width as f64 / source.width as f64;
    let sy = target.height as f64 / source.height as f64;
    let scale = sx.max(sy);

    // Truncation can land one pixel short; clamp so the frame always covers
    let width = ((source.width as f64 * scale) as u32).max(target.width);
    let height = ((source.height as f64 * scale) as u32).max(target.height);

    Ok(CoverScale {
        scaled: Resolution::new(width, height),
        target,
        crop_x: (width - target.width) / 2,
        crop_y: (height - target.height) / 2,
    })
}

/// Layout of the 9:16 stacked composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    pub canvas: Resolution,
    /// Main video, top half
    pub top: CoverScale,
    /// Background video, bottom half
    pub bottom: CoverScale,
}

/// Plan the stacked composite for a main (top) and background (bottom) video.
pub fn compose_stacked_layout(
    main: Resolution,
    background: Resolution,
) -> Result<CompositeLayout, GeometryError> {
    let canvas = Resolution::new(STACKED_CANVAS_WIDTH, STACKED_CANVAS_HEIGHT);
    let top_height = canvas.height / 2;
    let bottom_height = canvas.height - top_height;

    Ok(CompositeLayout {
        canvas,
        top: scale_to_cover(main, Resolution::new(canvas.width, top_height))?,
        bottom: scale_to_cover(background, Resolution::new(canvas.width, bottom_height))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1280x720").unwrap(), Resolution::new(1280, 720));
        assert_eq!(parse_resolution("640X480").unwrap(), Resolution::new(640, 480));
        assert_eq!(parse_resolution(" 320 x 240 ").unwrap(), Resolution::new(320, 240));

        for bad in ["1280", "1280x", "x720", "0x720", "1280x0", "-1x5", "axb", "1x2x3", ""] {
            assert!(parse_resolution(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_crop_bounds() {
        let src = Resolution::new(1920, 1080);
        let region = validate_crop_bounds(100, 50, 640, 480, src).unwrap();
        assert_eq!(region, CropRegion { x: 100, y: 50, width: 640, height: 480 });

        // Exactly touching the edges is allowed
        assert!(validate_crop_bounds(0, 0, 1920, 1080, src).is_ok());

        let err = validate_crop_bounds(1500, 0, 640, 480, src).unwrap_err();
        assert!(matches!(err, GeometryError::OutOfBounds { .. }));
        // Negative origins and empty regions never fit either
        for (x, y, w, h) in [
            (0, 700, 640, 480),
            (-1, 0, 10, 10),
            (0, -1, 10, 10),
            (0, 0, 0, 10),
            (0, 0, 10, -5),
            (i64::MAX, 0, 10, 10),
        ] {
            assert!(
                matches!(
                    validate_crop_bounds(x, y, w, h, src),
                    Err(GeometryError::OutOfBounds { .. })
                ),
                "({x},{y}) {w}x{h}"
            );
        }
    }

    #[test]
    fn test_scale_to_cover_landscape_into_half_canvas() {
        let plan =
            scale_to_cover(Resolution::new(1920, 1080), Resolution::new(1080, 960)).unwrap();
        assert_eq!(plan.scaled, Resolution::new(1706, 960));
        assert_eq!(plan.crop_x, 313);
        assert_eq!(plan.crop_y, 0);
    }

    #[test]
    fn test_scale_to_cover_portrait_source() {
        let plan = scale_to_cover(Resolution::new(720, 1280), Resolution::new(1080, 960)).unwrap();
        assert_eq!(plan.scaled.width, 1080);
        assert_eq!(plan.scaled.height, 1920);
        assert_eq!(plan.crop_x, 0);
        assert_eq!(plan.crop_y, 480);
    }

    #[test]
    fn test_scale_to_cover_always_covers() {
        let target = Resolution::new(1080, 960);
        for (w, h) in [(1, 1), (333, 777), (1919, 1079), (4096, 2160), (1081, 961)] {
            let plan = scale_to_cover(Resolution::new(w, h), target).unwrap();
            assert!(plan.scaled.width >= target.width, "{w}x{h}");
            assert!(plan.scaled.height >= target.height, "{w}x{h}");
            assert!(plan.crop_x + target.width <= plan.scaled.width);
            assert!(plan.crop_y + target.height <= plan.scaled.height);
        }
    }

    #[test]
    fn test_zero_source_rejected() {
        assert!(scale_to_cover(Resolution::new(0, 720), Resolution::new(1080, 960)).is_err());
    }

    #[test]
    fn test_stacked_layout_halves() {
        let layout =
            compose_stacked_layout(Resolution::new(1920, 1080), Resolution::new(1280, 720))
                .unwrap();
        assert_eq!(layout.canvas, Resolution::new(1080, 1920));
        assert_eq!(layout.top.target.height + layout.bottom.target.height, 1920);
        assert_eq!(layout.top.target.width, 1080);
        assert_eq!(layout.bottom.target.width, 1080);
    }
}
