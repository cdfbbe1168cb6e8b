//! Contour-trace outline
//!
//! Dark regions of the luma plane are traced and their borders drawn 1 px
//! wide on a white canvas. A border is kept only when its chain has more than
//! three vertices after collinear runs are collapsed, so specks and straight
//! hairlines are dropped as noise.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::point::Point;
use tracing::debug;

use super::types::{ensure_min_size, Result};
use super::OutlineExtractor;

/// Luma at or below this value is foreground
const DEFAULT_BINARY_THRESHOLD: u8 = 170;

/// Contours need more chain vertices than this to be drawn
const DEFAULT_MIN_CONTOUR_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourOutline {
    pub binary_threshold: u8,
    pub min_contour_points: usize,
}

impl Default for ContourOutline {
    fn default() -> Self {
        Self {
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
            min_contour_points: DEFAULT_MIN_CONTOUR_POINTS,
        }
    }
}

impl ContourOutline {
    /// Inverse binary threshold: dark pixels become 255, light ones 0
    fn foreground_mask(&self, image: &RgbImage) -> GrayImage {
        let mut gray = image::imageops::grayscale(image);
        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > self.binary_threshold { 0 } else { 255 };
        }
        gray
    }
}

/// Collapse straight runs of a closed border to their end points
///
/// Border points are 8-connected, so a vertex is any point where the step
/// direction changes.
pub fn chain_vertices(points: &[Point<u32>]) -> Vec<Point<u32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let step = |from: Point<u32>, to: Point<u32>| {
        (to.x as i64 - from.x as i64, to.y as i64 - from.y as i64)
    };
    let n = points.len();

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

impl OutlineExtractor for ContourOutline {
    fn extract(&self, image: &RgbImage) -> Result<RgbImage> {
        ensure_min_size(image.width(), image.height())?;

        let mask = self.foreground_mask(image);
        let contours = find_contours::<u32>(&mask);

        let mut canvas = RgbImage::from_pixel(image.width(), image.height(), Rgb([255, 255, 255]));
        let mut drawn = 0usize;
        for contour in contours
            .iter()
            .filter(|c| chain_vertices(&c.points).len() > self.min_contour_points)
        {
            for point in &contour.points {
                canvas.put_pixel(point.x, point.y, Rgb([0, 0, 0]));
            }
            drawn += 1;
        }
        debug!(found = contours.len(), drawn, "contours traced");

        Ok(canvas)
    }
}
