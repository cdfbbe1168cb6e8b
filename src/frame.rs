//! Array views over decoded frames
//!
//! `image` buffers are row-major with interleaved channels, which is exactly
//! the `(H, W)` / `(H, W, C)` layout the density check works on.

use image::{GrayImage, RgbImage};
use ndarray::{ArrayView, ArrayViewD, ShapeError};

/// Borrow a decoded image as an `ndarray` view
pub trait AsArrayView {
    fn as_array_view(&self) -> Result<ArrayViewD<'_, u8>, ShapeError>;
}

impl AsArrayView for GrayImage {
    fn as_array_view(&self) -> Result<ArrayViewD<'_, u8>, ShapeError> {
        let shape = (self.height() as usize, self.width() as usize);
        Ok(ArrayView::from_shape(shape, self.as_raw().as_slice())?.into_dyn())
    }
}

impl AsArrayView for RgbImage {
    fn as_array_view(&self) -> Result<ArrayViewD<'_, u8>, ShapeError> {
        let shape = (self.height() as usize, self.width() as usize, 3);
        Ok(ArrayView::from_shape(shape, self.as_raw().as_slice())?.into_dyn())
    }
}
