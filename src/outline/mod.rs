//! Outline extraction module
//!
//! Converts a color frame into a dark-on-white edge map.
//!
//! # Features
//!
//! - **Gradient** ([`gradient`]) - Adjacent-pixel color difference threshold with
//!   2x2 morphological cleanup and smoothing (default)
//! - **Canny** ([`canny`]) - Inverted Canny edge map
//! - **Contour** ([`contour`]) - Traced borders of dark regions
//!
//! Strategies are chosen explicitly through [`OutlineStrategy`]; every strategy
//! keeps the source's spatial dimensions and returns 3 identical channels.
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_outline::{OutlineExtractor, OutlineStrategy};
//!
//! let frame = image::open("frame.png").unwrap().to_rgb8();
//! let outline = OutlineStrategy::Gradient.extract(&frame).unwrap();
//! outline.save("frame_outline.png").unwrap();
//! ```

pub mod canny;
pub mod contour;
pub mod gradient;
pub mod morphology;
mod types;

use image::{GrayImage, Rgb, RgbImage};
use ndarray::{ArrayViewD, Axis, Ix3};
use tracing::debug;

// Re-export public API
pub use canny::CannyOutline;
pub use contour::ContourOutline;
pub use gradient::{accumulate_edges, DifferenceMap, GradientOutline, DEFAULT_DIFF_THRESHOLD};
pub use types::{OutlineError, OutlineStrategy, Result, MIN_DIMENSION};

/// Turns a 3-channel image into an outline of the same size
pub trait OutlineExtractor {
    fn extract(&self, image: &RgbImage) -> Result<RgbImage>;
}

impl OutlineExtractor for OutlineStrategy {
    fn extract(&self, image: &RgbImage) -> Result<RgbImage> {
        debug!(
            strategy = %self,
            width = image.width(),
            height = image.height(),
            "extracting outline"
        );

        match self {
            OutlineStrategy::Contour => ContourOutline::default().extract(image),
            OutlineStrategy::Canny => CannyOutline::default().extract(image),
            OutlineStrategy::Gradient => GradientOutline::default().extract(image),
        }
    }
}

/// Extract an outline with the default (gradient) strategy
pub fn extract(image: &RgbImage) -> Result<RgbImage> {
    OutlineStrategy::default().extract(image)
}

/// Extract from an `(H, W, 3)` array
///
/// Any other rank or channel count is rejected before extraction.
pub fn extract_array(strategy: OutlineStrategy, image: ArrayViewD<'_, u8>) -> Result<RgbImage> {
    let image = image
        .into_dimensionality::<Ix3>()
        .map_err(|e| OutlineError::InvalidShape(format!("expected (H, W, 3): {e}")))?;
    let channels = image.len_of(Axis(2));
    if channels != 3 {
        return Err(OutlineError::InvalidChannels(channels));
    }

    let (height, width) = (image.len_of(Axis(0)), image.len_of(Axis(1)));
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(OutlineError::InvalidShape(format!(
                "dimensions exceed u32: {:?}",
                image.shape()
            )))
        }
    };

    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]]])
    });

    strategy.extract(&rgb)
}

/// Replicate a single plane across three channels
pub(crate) fn gray_to_rgb(plane: &GrayImage) -> RgbImage {
    RgbImage::from_fn(plane.width(), plane.height(), |x, y| {
        let v = plane.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

// ============================================================
// Tests
// ============================================================
