//! Canny edge detector outline
//!
//! Each color channel goes through the detector on its own and a pixel is an
//! edge when any channel marks it, so edges between colors of equal luma are
//! still found. Gradients are not merged before non-maximum suppression, so
//! edge placement can differ by a pixel from a detector that picks the
//! strongest channel gradient first.

use image::{GrayImage, Luma, RgbImage};
use imageproc::edges::canny;

use super::types::{ensure_min_size, Result};
use super::{gray_to_rgb, OutlineExtractor};

/// Default hysteresis thresholds
const DEFAULT_LOW_THRESHOLD: f32 = 200.0;
const DEFAULT_HIGH_THRESHOLD: f32 = 400.0;

/// Inverted per-channel Canny edge map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyOutline {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyOutline {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl OutlineExtractor for CannyOutline {
    fn extract(&self, image: &RgbImage) -> Result<RgbImage> {
        ensure_min_size(image.width(), image.height())?;

        let (width, height) = image.dimensions();
        let mut edges = GrayImage::new(width, height);
        for channel in 0..3 {
            let plane = GrayImage::from_fn(width, height, |x, y| {
                Luma([image.get_pixel(x, y).0[channel]])
            });
            let channel_edges = canny(&plane, self.low_threshold, self.high_threshold);
            for (out, edge) in edges.pixels_mut().zip(channel_edges.pixels()) {
                out.0[0] = out.0[0].max(edge.0[0]);
            }
        }
        image::imageops::invert(&mut edges);

        Ok(gray_to_rgb(&edges))
    }
}
