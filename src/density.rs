//! Content density evaluation
//!
//! # Overview
//!
//! Measures how much of an image is blank ("white") and decides whether the
//! image carries enough content to keep. Works on any `(H, W)` or `(H, W, C)`
//! image, not only outlines.
//!
//! # Algorithm
//!
//! 1. Divide each pixel of the first channel by `max_val`
//! 2. Round to the nearest integer (ties to even), so each pixel counts as 0 or 1
//! 3. Sum and divide by `H * W`
//!
//! Multi-channel images must have identical channels (within
//! [`DensityOptions::channel_tolerance`]); outlines satisfy this because every
//! extractor replicates one plane. Diverging channels are an error rather than
//! being silently ignored.
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_outline::{extract, AsArrayView, ContentDensityEvaluator};
//!
//! let frame = image::open("frame.png").unwrap().to_rgb8();
//! let outline = extract(&frame).unwrap();
//!
//! let evaluator = ContentDensityEvaluator::default();
//! let keep = evaluator.has_content(outline.as_array_view().unwrap()).unwrap();
//! println!("keep frame: {keep}");
//! ```

use ndarray::{ArrayViewD, Axis, ShapeError, Zip};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// ============================================================
// Constants
// ============================================================

/// Default full-scale pixel value
pub const DEFAULT_MAX_VAL: f64 = 255.0;

/// Default white fraction at or above which an image is contentless
pub const DEFAULT_CONTENT_THRESHOLD: f64 = 0.96;

/// Default allowed per-pixel difference between channels
const DEFAULT_CHANNEL_TOLERANCE: u8 = 0;

// ============================================================
// Errors
// ============================================================

/// Density evaluation error types
#[derive(Debug, Error)]
pub enum DensityError {
    #[error("Image must have 2 or 3 dimensions, got {0}")]
    InvalidRank(usize),

    #[error("Image is empty: shape {0:?}")]
    EmptyImage(Vec<usize>),

    #[error("max_val must be finite and positive, got {0}")]
    InvalidMaxValue(f64),

    #[error("threshold must be finite, got {0}")]
    InvalidThreshold(f64),

    #[error("Channel {channel} differs from channel 0 by more than {tolerance}")]
    ChannelMismatch { channel: usize, tolerance: u8 },

    #[error("Invalid array layout: {0}")]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, DensityError>;

// ============================================================
// Options
// ============================================================

/// Options for content density evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityOptions {
    /// White fraction at or above which the image has no content
    pub threshold: f64,

    /// Full-scale pixel value used for normalization
    pub max_val: f64,

    /// Largest allowed difference between channel 0 and any other channel
    pub channel_tolerance: u8,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONTENT_THRESHOLD,
            max_val: DEFAULT_MAX_VAL,
            channel_tolerance: DEFAULT_CHANNEL_TOLERANCE,
        }
    }
}

impl DensityOptions {
    /// Create a builder
    pub fn builder() -> DensityOptionsBuilder {
        DensityOptionsBuilder::default()
    }

    /// Keep almost everything: only fully blank frames are dropped
    pub fn lenient() -> Self {
        Self {
            threshold: 1.0,
            ..Default::default()
        }
    }

    /// Require noticeably more strokes than the default
    pub fn strict() -> Self {
        Self {
            threshold: 0.9,
            ..Default::default()
        }
    }
}

/// Builder for DensityOptions
#[derive(Debug, Default)]
pub struct DensityOptionsBuilder {
    options: DensityOptions,
}

impl DensityOptionsBuilder {
    /// Set the content threshold (clamped to 0.0-1.0, NaN is kept and rejected on use)
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.options.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the full-scale pixel value
    #[must_use]
    pub fn max_val(mut self, max_val: f64) -> Self {
        self.options.max_val = max_val;
        self
    }

    /// Set the allowed channel divergence
    #[must_use]
    pub fn channel_tolerance(mut self, tolerance: u8) -> Self {
        self.options.channel_tolerance = tolerance;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DensityOptions {
        self.options
    }
}

/// Result of one density evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityResult {
    /// Fraction of white pixels (0.0-1.0)
    pub fraction_white: f64,

    /// Whether the image has enough content to keep
    pub has_content: bool,
}

// ============================================================
// Evaluator
// ============================================================

/// Content density evaluator
#[derive(Debug, Clone, Default)]
pub struct ContentDensityEvaluator {
    options: DensityOptions,
}

impl ContentDensityEvaluator {
    pub fn new(options: DensityOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DensityOptions {
        &self.options
    }

    /// Fraction of pixels closer to `max_val` than to 0
    pub fn fraction_white(&self, image: ArrayViewD<'_, u8>) -> Result<f64> {
        let max_val = self.options.max_val;
        if !max_val.is_finite() || max_val <= 0.0 {
            return Err(DensityError::InvalidMaxValue(max_val));
        }

        let plane = match image.ndim() {
            2 => image,
            3 => {
                if image.len_of(Axis(2)) == 0 {
                    return Err(DensityError::EmptyImage(image.shape().to_vec()));
                }
                check_channels_agree(&image, self.options.channel_tolerance)?;
                image.index_axis_move(Axis(2), 0)
            }
            rank => return Err(DensityError::InvalidRank(rank)),
        };

        let total = plane.len();
        if total == 0 {
            return Err(DensityError::EmptyImage(plane.shape().to_vec()));
        }

        // Values above max_val still count as a single white pixel
        let white: f64 = plane
            .iter()
            .map(|&v| (v as f64 / max_val).round_ties_even().min(1.0))
            .sum();

        Ok(white / total as f64)
    }

    /// True when the white fraction is below the threshold
    pub fn has_content(&self, outline: ArrayViewD<'_, u8>) -> Result<bool> {
        Ok(self.evaluate(outline)?.has_content)
    }

    /// Fraction and decision in one pass
    pub fn evaluate(&self, image: ArrayViewD<'_, u8>) -> Result<DensityResult> {
        let threshold = self.options.threshold;
        if !threshold.is_finite() {
            return Err(DensityError::InvalidThreshold(threshold));
        }

        let fraction_white = self.fraction_white(image)?;
        let has_content = fraction_white < threshold;

        debug!(
            fraction_white,
            threshold,
            has_content,
            "density evaluated"
        );

        Ok(DensityResult {
            fraction_white,
            has_content,
        })
    }
}

/// Every channel must match channel 0 within `tolerance`
fn check_channels_agree(image: &ArrayViewD<'_, u8>, tolerance: u8) -> Result<()> {
    let first = image.index_axis(Axis(2), 0);

    for channel in 1..image.len_of(Axis(2)) {
        let other = image.index_axis(Axis(2), channel);
        let agree = Zip::from(&first)
            .and(&other)
            .all(|&a, &b| a.abs_diff(b) <= tolerance);
        if !agree {
            return Err(DensityError::ChannelMismatch { channel, tolerance });
        }
    }

    Ok(())
}

/// Fraction of white pixels with default channel tolerance
pub fn fraction_white(image: ArrayViewD<'_, u8>, max_val: f64) -> Result<f64> {
    ContentDensityEvaluator::new(DensityOptions {
        max_val,
        ..Default::default()
    })
    .fraction_white(image)
}

/// `fraction_white(outline, max_val) < threshold`
pub fn has_content(outline: ArrayViewD<'_, u8>, threshold: f64, max_val: f64) -> Result<bool> {
    ContentDensityEvaluator::new(DensityOptions {
        threshold,
        max_val,
        ..Default::default()
    })
    .has_content(outline)
}

// ============================================================
// Tests
// ============================================================
