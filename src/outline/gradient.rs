//! Gradient-threshold outline extraction
//!
//! # Algorithm
//!
//! 1. Sum the absolute per-channel differences between vertically and
//!    horizontally adjacent pixels (widened to `i32`)
//! 2. Subtract the threshold and clamp to `{0, 1}` to get two difference maps
//! 3. Accumulate both maps into one edge mask; a pixel with both a vertical
//!    and a horizontal edge still counts once
//! 4. Morphological cleanup with a 2x2 element (close x2, erode, dilate, open)
//! 5. 2x2 box blur, then invert so edges are dark on a white background

use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use super::morphology::{box_blur_2x2, refine_edges};
use super::types::{ensure_min_size, Result};
use super::{gray_to_rgb, OutlineExtractor};

// ============================================================
// Constants
// ============================================================

/// Default summed color distance an adjacent pair must exceed to be an edge
pub const DEFAULT_DIFF_THRESHOLD: i32 = 30;

/// Largest meaningful threshold (3 channels x 255)
const MAX_DIFF_THRESHOLD: i32 = 3 * 255;

// ============================================================
// Difference Map
// ============================================================

/// Per-adjacent-pair edge indicator (0 or 1)
///
/// The vertical map is `width x (height - 1)`, entry `(x, r)` comparing rows
/// `r + 1` and `r`. The horizontal map is `(width - 1) x height`, entry `(c, y)`
/// comparing columns `c + 1` and `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DifferenceMap {
    /// Differences between each row and the row above it
    pub fn vertical(image: &RgbImage, threshold: i32) -> Self {
        let (width, height) = image.dimensions();
        let rows = height.saturating_sub(1);
        let mut data = Vec::with_capacity((width * rows) as usize);

        for y in 1..height {
            for x in 0..width {
                data.push(edge_indicator(
                    image.get_pixel(x, y).0,
                    image.get_pixel(x, y - 1).0,
                    threshold,
                ));
            }
        }

        Self {
            width,
            height: rows,
            data,
        }
    }

    /// Differences between each column and the column to its left
    pub fn horizontal(image: &RgbImage, threshold: i32) -> Self {
        let (width, height) = image.dimensions();
        let cols = width.saturating_sub(1);
        let mut data = Vec::with_capacity((cols * height) as usize);

        for y in 0..height {
            for x in 1..width {
                data.push(edge_indicator(
                    image.get_pixel(x, y).0,
                    image.get_pixel(x - 1, y).0,
                    threshold,
                ));
            }
        }

        Self {
            width: cols,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Number of pairs marked as edges
    pub fn edge_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// `clamp(sum |a - b| - threshold, 0, 1)`; on integers the rounding step is a no-op
fn edge_indicator(a: [u8; 3], b: [u8; 3], threshold: i32) -> u8 {
    let distance: i32 = a
        .iter()
        .zip(b.iter())
        .map(|(&p, &q)| (p as i32 - q as i32).abs())
        .sum();
    (distance - threshold).clamp(0, 1) as u8
}

/// Merge both maps into a `{0, 255}` mask of the image's shape
///
/// The vertical map lands on rows `1..height`, the horizontal map on columns
/// `1..width`. Overlaps are clamped to a single edge, not summed.
pub fn accumulate_edges(vertical: &DifferenceMap, horizontal: &DifferenceMap) -> GrayImage {
    let width = vertical.width();
    let height = horizontal.height();

    GrayImage::from_fn(width, height, |x, y| {
        let mut hits = 0u8;
        if y >= 1 {
            hits += vertical.get(x, y - 1).unwrap_or(0);
        }
        if x >= 1 {
            hits += horizontal.get(x - 1, y).unwrap_or(0);
        }
        Luma([hits.min(1) * 255])
    })
}

// ============================================================
// Extractor
// ============================================================

/// Adjacent-pixel color difference outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientOutline {
    /// Summed color distance a neighbour pair must exceed
    pub diff_threshold: i32,
}

impl Default for GradientOutline {
    fn default() -> Self {
        Self {
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
        }
    }
}

impl GradientOutline {
    /// Create with a custom threshold, clamped to `0..=765`
    pub fn with_threshold(threshold: i32) -> Self {
        Self {
            diff_threshold: threshold.clamp(0, MAX_DIFF_THRESHOLD),
        }
    }

    /// Raw `{0, 255}` edge mask before morphology
    pub fn edge_mask(&self, image: &RgbImage) -> Result<GrayImage> {
        ensure_min_size(image.width(), image.height())?;

        let vertical = DifferenceMap::vertical(image, self.diff_threshold);
        let horizontal = DifferenceMap::horizontal(image, self.diff_threshold);
        debug!(
            vertical_edges = vertical.edge_count(),
            horizontal_edges = horizontal.edge_count(),
            "difference maps computed"
        );

        Ok(accumulate_edges(&vertical, &horizontal))
    }
}

impl OutlineExtractor for GradientOutline {
    fn extract(&self, image: &RgbImage) -> Result<RgbImage> {
        let mask = self.edge_mask(image)?;

        // Channels are identical, so the cleanup runs once on a single plane
        let refined = refine_edges(&mask);
        let mut smoothed = box_blur_2x2(&refined);
        image::imageops::invert(&mut smoothed);

        Ok(gray_to_rgb(&smoothed))
    }
}

// ============================================================
// Tests
// ============================================================
