//! Binary morphology and smoothing with a 2x2 structuring element
//!
//! The element is anchored at its bottom-right cell, so both erosion and
//! dilation look at the window `x-1..=x, y-1..=y`. Pixels outside the image
//! are neutral: they never unset a pixel during erosion and never set one
//! during dilation. Repeated passes therefore drift content down and right.

use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

const SET: u8 = 255;

/// Iterations of the leading close
const CLOSE_ITERATIONS: u32 = 2;

/// 2x2 element with its origin at the bottom-right cell
fn structuring_element() -> Mask {
    Mask::from_image(&GrayImage::from_pixel(2, 2, Luma([SET])), 1, 1)
}

type MaskOp = fn(&GrayImage, &Mask) -> GrayImage;

fn repeat(src: &GrayImage, iterations: u32, op: MaskOp) -> GrayImage {
    let element = structuring_element();
    let mut out = src.clone();
    for _ in 0..iterations {
        out = op(&out, &element);
    }
    out
}

pub fn erode(src: &GrayImage, iterations: u32) -> GrayImage {
    repeat(src, iterations, grayscale_erode)
}

pub fn dilate(src: &GrayImage, iterations: u32) -> GrayImage {
    repeat(src, iterations, grayscale_dilate)
}

/// Morphological open: `iterations` erosions followed by as many dilations
pub fn open(src: &GrayImage, iterations: u32) -> GrayImage {
    dilate(&erode(src, iterations), iterations)
}

/// Morphological close: `iterations` dilations followed by as many erosions
pub fn close(src: &GrayImage, iterations: u32) -> GrayImage {
    erode(&dilate(src, iterations), iterations)
}

/// Cleanup sequence applied to a raw edge mask
///
/// close x2 merges nearby fragments, then erode/dilate/open drops strokes
/// thinner than two pixels. The order is fixed.
pub fn refine_edges(mask: &GrayImage) -> GrayImage {
    let closed = close(mask, CLOSE_ITERATIONS);
    let eroded = erode(&closed, 1);
    let dilated = dilate(&eroded, 1);
    open(&dilated, 1)
}

/// Mirror an index around the edge pixel without repeating it
fn reflect_101(i: i64, len: u32) -> u32 {
    let len = len as i64;
    if len <= 1 {
        return 0;
    }
    let period = 2 * len - 2;
    let r = i.rem_euclid(period);
    (if r < len { r } else { period - r }) as u32
}

/// 2x2 uniform box blur over `x-1..=x, y-1..=y` with reflect-101 borders
pub fn box_blur_2x2(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0u32;
        for dy in [-1i64, 0] {
            let sy = reflect_101(y as i64 + dy, height);
            for dx in [-1i64, 0] {
                let sx = reflect_101(x as i64 + dx, width);
                sum += src.get_pixel(sx, sy).0[0] as u32;
            }
        }
        Luma([(sum as f32 / 4.0).round() as u8])
    })
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: u32, height: u32, set: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y) in set {
            mask.put_pixel(x, y, Luma([SET]));
        }
        mask
    }

    fn set_pixels(mask: &GrayImage) -> Vec<(u32, u32)> {
        mask.enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    fn transpose(mask: &GrayImage) -> GrayImage {
        GrayImage::from_fn(mask.height(), mask.width(), |x, y| *mask.get_pixel(y, x))
    }

    #[test]
    fn test_open_removes_single_pixel_speck() {
        let mask = mask_with(5, 5, &[(2, 2)]);
        let out = open(&mask, 1);
        assert!(set_pixels(&out).is_empty());
    }

    #[test]
    fn test_close_fills_single_pixel_hole() {
        let mut mask = GrayImage::from_pixel(6, 6, Luma([SET]));
        mask.put_pixel(3, 3, Luma([0]));

        let out = close(&mask, 1);
        assert!(out.pixels().all(|p| p.0[0] == SET));
    }

    #[test]
    fn test_close_drifts_toward_bottom_right() {
        let block: Vec<(u32, u32)> = (3..6).flat_map(|y| (3..6).map(move |x| (x, y))).collect();
        let mask = mask_with(10, 10, &block);

        let shifted: Vec<(u32, u32)> = (5..8).flat_map(|y| (5..8).map(move |x| (x, y))).collect();
        assert_eq!(set_pixels(&close(&mask, 2)), shifted);
    }

    #[test]
    fn test_dilate_grows_down_and_right() {
        let mask = mask_with(4, 4, &[(2, 2)]);
        let out = dilate(&mask, 1);
        assert_eq!(set_pixels(&out), vec![(2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_erode_keeps_full_mask() {
        let mask = GrayImage::from_pixel(4, 4, Luma([SET]));
        assert_eq!(erode(&mask, 3), mask);
    }

    #[test]
    fn test_dilate_keeps_empty_mask() {
        let mask = GrayImage::new(4, 4);
        assert_eq!(dilate(&mask, 3), mask);
    }

    #[test]
    fn test_refine_edges_keeps_full_mask() {
        let mask = GrayImage::from_pixel(9, 7, Luma([SET]));
        assert_eq!(refine_edges(&mask), mask);
    }

    #[test]
    fn test_refine_edges_corner_hole_spreads_equally() {
        let mut mask = GrayImage::from_pixel(10, 10, Luma([SET]));
        mask.put_pixel(0, 0, Luma([0]));

        let out = refine_edges(&mask);
        assert_eq!(set_pixels(&out).len(), 75);

        let expected = [0, 0, 0, 0, 0, SET, SET, SET, SET, SET];
        let top: Vec<u8> = (0..10).map(|x| out.get_pixel(x, 0).0[0]).collect();
        let left: Vec<u8> = (0..10).map(|y| out.get_pixel(0, y).0[0]).collect();
        assert_eq!(top, expected);
        assert_eq!(left, expected);
    }

    #[test]
    fn test_refine_edges_commutes_with_transpose() {
        let mask = GrayImage::from_fn(11, 7, |x, y| {
            Luma([if (x * 7 + y * 3) % 5 < 3 { SET } else { 0 }])
        });
        assert_eq!(refine_edges(&transpose(&mask)), transpose(&refine_edges(&mask)));
    }

    #[test]
    fn test_refine_edges_keeps_thick_region() {
        let block: Vec<(u32, u32)> = (4..12).flat_map(|y| (4..12).map(move |x| (x, y))).collect();
        let mask = mask_with(16, 16, &block);

        let out = refine_edges(&mask);
        assert_eq!(out.get_pixel(8, 8).0[0], SET);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_refine_edges_empty_mask() {
        let mask = GrayImage::new(8, 8);
        assert!(set_pixels(&refine_edges(&mask)).is_empty());
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(0, 5), 0);
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(-1, 2), 1);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn test_box_blur_values() {
        // Single set pixel at (1, 1) spreads into the 2x2 block below-right of it
        let mask = mask_with(4, 4, &[(1, 1)]);
        let out = box_blur_2x2(&mask);

        assert_eq!(out.get_pixel(1, 1).0[0], 64);
        assert_eq!(out.get_pixel(2, 2).0[0], 64);
        // (0, 0) mirrors its missing neighbours onto row 1 and column 1
        assert_eq!(out.get_pixel(0, 0).0[0], 64);
        assert_eq!(out.get_pixel(3, 3).0[0], 0);
        assert_eq!(out.get_pixel(3, 1).0[0], 0);
    }

    #[test]
    fn test_box_blur_uniform_is_identity() {
        let img = GrayImage::from_pixel(5, 4, Luma([200]));
        assert_eq!(box_blur_2x2(&img), img);
    }
}
