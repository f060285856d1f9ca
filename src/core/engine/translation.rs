//! Translation-only stitching for panned photo sequences.
//!
//! Consecutive images are aligned by a pure (dx, dy) shift found by an
//! exhaustive search over small grayscale previews, then composited onto a
//! shared canvas with horizontal feathering. There is no rotation, no
//! perspective warp and no exposure compensation, which keeps the engine
//! deterministic: the same inputs always produce the same bytes.
//!
//! ## Failure codes
//! - `NeedMoreImages` - fewer than two images, images without texture, or
//!   no shift with enough overlap
//! - `HomographyEstimationFailed` - the best shift still matches poorly
//! - `CameraParameterAdjustmentFailed` - the accumulated layout does not fit
//!   on a canvas of the configured size

use super::{StitchEngine, StitchOutcome};
use crate::core::loader::FastResizer;
use crate::error::FailureCode;
use image::{imageops, GrayImage, Rgb, RgbImage};

/// Status reported when preview construction fails unexpectedly
const PREVIEW_FAILED_STATUS: i32 = -1;

/// Tuning for `TranslationStitcher`
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Height of the grayscale previews used for the offset search
    pub preview_height: u32,
    /// Smallest horizontal overlap, as a fraction of the narrower image
    pub min_overlap: f32,
    /// Largest vertical drift, as a fraction of the shorter image
    pub max_vertical_shift: f32,
    /// Mean absolute difference (0-255) above which alignment is rejected
    pub match_tolerance: f32,
    /// Minimum preview standard deviation
    pub min_texture: f32,
    /// Largest canvas side in pixels
    pub max_canvas_side: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            preview_height: 96,
            min_overlap: 0.1,
            max_vertical_shift: 0.1,
            match_tolerance: 30.0,
            min_texture: 2.0,
            max_canvas_side: 32_768,
        }
    }
}

/// Translation-only stitch engine
#[derive(Debug, Clone, Default)]
pub struct TranslationStitcher {
    config: TranslationConfig,
}

impl TranslationStitcher {
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }

    fn preview_scale(&self, images: &[&RgbImage]) -> f32 {
        let min_height = images.iter().map(|i| i.height()).min().unwrap_or(1).max(1);
        (self.config.preview_height as f32 / min_height as f32).min(1.0)
    }

    fn preview(&self, image: &RgbImage, scale: f32) -> Result<GrayImage, FailureCode> {
        let gray = imageops::grayscale(image);
        let width = ((image.width() as f32 * scale).round() as u32).max(1);
        let height = ((image.height() as f32 * scale).round() as u32).max(1);

        FastResizer::new()
            .resize_gray(&gray, width, height)
            .map_err(|e| {
                tracing::debug!("preview resize failed: {}", e);
                FailureCode::Other(PREVIEW_FAILED_STATUS)
            })
    }

    /// Best shift of `b` relative to `a`, in preview pixels
    fn estimate_offset(&self, a: &GrayImage, b: &GrayImage) -> Result<(i64, i64), FailureCode> {
        if texture(a) < self.config.min_texture || texture(b) < self.config.min_texture {
            return Err(FailureCode::NeedMoreImages);
        }

        let (aw, ah) = (a.width() as i64, a.height() as i64);
        let (bw, bh) = (b.width() as i64, b.height() as i64);
        let min_overlap = ((self.config.min_overlap * aw.min(bw) as f32).ceil() as i64).max(1);
        let max_dy = (self.config.max_vertical_shift * ah.min(bh) as f32).floor() as i64;

        let mut best: Option<(f32, i64, i64)> = None;
        for dy in -max_dy..=max_dy {
            let y0 = dy.max(0);
            let y1 = ah.min(dy + bh);
            if y1 <= y0 {
                continue;
            }
            for dx in 0..=(aw - min_overlap) {
                let x1 = aw.min(dx + bw);
                if x1 - dx < min_overlap {
                    continue;
                }
                let score = mean_abs_diff(a, b, dx, dy, (dx, x1), (y0, y1));
                if best.map_or(true, |(s, _, _)| score < s) {
                    best = Some((score, dx, dy));
                }
            }
        }

        let (score, dx, dy) = best.ok_or(FailureCode::NeedMoreImages)?;
        tracing::trace!(score, dx, dy, "best pair offset");
        if score > self.config.match_tolerance {
            return Err(FailureCode::HomographyEstimationFailed);
        }
        Ok((dx, dy))
    }

    /// Canvas size and per-image origins for absolute positions
    fn layout(
        &self,
        images: &[&RgbImage],
        positions: &[(i64, i64)],
    ) -> Result<(u32, u32, Vec<(u32, u32)>), FailureCode> {
        let min_x = positions.iter().map(|p| p.0).min().unwrap_or(0);
        let min_y = positions.iter().map(|p| p.1).min().unwrap_or(0);
        let max_x = images
            .iter()
            .zip(positions)
            .map(|(i, p)| p.0 + i.width() as i64)
            .max()
            .unwrap_or(0);
        let max_y = images
            .iter()
            .zip(positions)
            .map(|(i, p)| p.1 + i.height() as i64)
            .max()
            .unwrap_or(0);

        let width = max_x - min_x;
        let height = max_y - min_y;
        let limit = self.config.max_canvas_side as i64;
        if width <= 0 || height <= 0 || width > limit || height > limit {
            return Err(FailureCode::CameraParameterAdjustmentFailed);
        }

        let origins = positions
            .iter()
            .map(|p| ((p.0 - min_x) as u32, (p.1 - min_y) as u32))
            .collect();
        Ok((width as u32, height as u32, origins))
    }
}

impl StitchEngine for TranslationStitcher {
    fn stitch(&self, images: &[&RgbImage]) -> StitchOutcome {
        if images.len() < 2 || images.iter().any(|i| i.width() == 0 || i.height() == 0) {
            return Err(FailureCode::NeedMoreImages);
        }

        let scale = self.preview_scale(images);
        let previews = images
            .iter()
            .map(|image| self.preview(image, scale))
            .collect::<Result<Vec<_>, _>>()?;

        let mut positions = vec![(0i64, 0i64)];
        for pair in previews.windows(2) {
            let (dx, dy) = self.estimate_offset(&pair[0], &pair[1])?;
            let (px, py) = positions[positions.len() - 1];
            positions.push((
                px + (dx as f32 / scale).round() as i64,
                py + (dy as f32 / scale).round() as i64,
            ));
        }
        drop(previews);

        let (width, height, origins) = self.layout(images, &positions)?;
        Ok(composite(images, &origins, width, height))
    }

    fn name(&self) -> &'static str {
        "translation"
    }
}

fn texture(image: &GrayImage) -> f32 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let n = raw.len() as f64;
    let mean = raw.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = raw.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() as f32
}

fn mean_abs_diff(
    a: &GrayImage,
    b: &GrayImage,
    dx: i64,
    dy: i64,
    (x0, x1): (i64, i64),
    (y0, y1): (i64, i64),
) -> f32 {
    let (aw, bw) = (a.width() as usize, b.width() as usize);
    let (a_raw, b_raw) = (a.as_raw(), b.as_raw());

    let mut sum: u64 = 0;
    for y in y0..y1 {
        let a_row = y as usize * aw;
        let b_row = (y - dy) as usize * bw;
        for x in x0..x1 {
            let pa = a_raw[a_row + x as usize];
            let pb = b_raw[b_row + (x - dx) as usize];
            sum += pa.abs_diff(pb) as u64;
        }
    }

    let count = ((x1 - x0) * (y1 - y0)) as f32;
    sum as f32 / count
}

/// Weighted average of all images on the canvas.
///
/// Each column is weighted by its distance to the nearest vertical edge of
/// its source image, so seams fade linearly across the overlap.
fn composite(images: &[&RgbImage], origins: &[(u32, u32)], width: u32, height: u32) -> RgbImage {
    let canvas_len = width as usize * height as usize;
    let mut sums = vec![[0f32; 3]; canvas_len];
    let mut weights = vec![0f32; canvas_len];

    for (image, &(ox, oy)) in images.iter().zip(origins) {
        let w = image.width();
        for (x, y, pixel) in image.enumerate_pixels() {
            let feather = (x.min(w - 1 - x) + 1) as f32;
            let idx = (oy + y) as usize * width as usize + (ox + x) as usize;
            for c in 0..3 {
                sums[idx][c] += pixel[c] as f32 * feather;
            }
            weights[idx] += feather;
        }
    }

    RgbImage::from_fn(width, height, |x, y| {
        let idx = y as usize * width as usize + x as usize;
        let weight = weights[idx];
        if weight == 0.0 {
            return Rgb([0, 0, 0]);
        }
        let sum = sums[idx];
        Rgb([0, 1, 2].map(|c| (sum[c] / weight).round().clamp(0.0, 255.0) as u8))
    })
}
