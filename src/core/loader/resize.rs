//! SIMD resizing with fast_image_resize.
//!
//! Used twice: by the loader to normalize every photo to the working
//! resolution, and by the translation engine to build small grayscale
//! previews for offset search.

use crate::error::ResizeError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage};

/// Reusable resizer; keep one per worker task.
pub struct FastResizer {
    resizer: Resizer,
    options: ResizeOptions,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        }
    }

    /// Resize to exactly `width x height` RGB8, ignoring aspect ratio.
    pub fn resize_rgb(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, ResizeError> {
        let rgb = image.to_rgb8();
        check_dimensions(rgb.width(), rgb.height())?;
        check_dimensions(width, height)?;

        if rgb.dimensions() == (width, height) {
            return Ok(rgb);
        }

        let raw = self.resize_raw(rgb.width(), rgb.height(), rgb.into_raw(), width, height, PixelType::U8x3)?;
        ImageBuffer::from_raw(width, height, raw)
            .ok_or_else(|| ResizeError::Buffer("RGB output size mismatch".to_string()))
    }

    /// Resize a grayscale image to exactly `width x height`.
    pub fn resize_gray(
        &mut self,
        image: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, ResizeError> {
        check_dimensions(image.width(), image.height())?;
        check_dimensions(width, height)?;

        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }

        let raw = self.resize_raw(
            image.width(),
            image.height(),
            image.as_raw().clone(),
            width,
            height,
            PixelType::U8,
        )?;
        ImageBuffer::from_raw(width, height, raw)
            .ok_or_else(|| ResizeError::Buffer("Luma output size mismatch".to_string()))
    }

    fn resize_raw(
        &mut self,
        src_width: u32,
        src_height: u32,
        src: Vec<u8>,
        width: u32,
        height: u32,
        pixel_type: PixelType,
    ) -> Result<Vec<u8>, ResizeError> {
        let src_image = Image::from_vec_u8(src_width, src_height, src, pixel_type)
            .map_err(|e| ResizeError::Buffer(e.to_string()))?;
        let mut dst_image = Image::new(width, height, pixel_type);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .map_err(|e| ResizeError::Resize(e.to_string()))?;

        Ok(dst_image.into_vec())
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::InvalidDimensions { width, height });
    }
    Ok(())
}
