//! Format-aware decoding.
//!
//! JPEG goes through zune-jpeg first and falls back to the image crate;
//! every other format goes straight to the image crate.

use crate::error::LoadError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode an in-memory image file.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    let image = if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        decode_jpeg(path, bytes).or_else(|_| decode_fallback(path, bytes))?
    } else {
        decode_fallback(path, bytes)?
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(LoadError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    Ok(image)
}

fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder.decode().map_err(|e| decode_error(path, format!("zune-jpeg: {:?}", e)))?;

    let info = decoder
        .info()
        .ok_or_else(|| decode_error(path, "missing JPEG header info".to_string()))?;
    let width = info.width as u32;
    let height = info.height as u32;

    match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
        ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| decode_error(path, "RGB buffer size mismatch".to_string())),
        ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| decode_error(path, "RGBA buffer size mismatch".to_string())),
        ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| decode_error(path, "Luma buffer size mismatch".to_string())),
        other => Err(decode_error(
            path,
            format!("unsupported JPEG colorspace {:?}", other),
        )),
    }
}

fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    image::load_from_memory(bytes).map_err(|e| decode_error(path, e.to_string()))
}

fn decode_error(path: &Path, reason: String) -> LoadError {
    LoadError::Decode {
        path: path.to_path_buf(),
        reason,
    }
}
