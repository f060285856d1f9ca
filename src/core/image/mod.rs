//! # Image Module
//!
//! Pixel buffers that flow through the pipeline.
//!
//! Both a freshly loaded photo and a stitched panorama expose an `RgbImage`,
//! which is what lets a partial panorama be fed into a further stitch
//! exactly like a source photo.

use crate::error::ConfigError;
use chrono::NaiveDateTime;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// Working resolution every source photo is normalized to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    /// Bytes held by one RGB8 buffer at this resolution
    pub fn buffer_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Anything that can be handed to a stitch engine
pub trait StitchInput {
    fn pixels(&self) -> &RgbImage;
}

/// A decoded photo normalized to the working resolution.
///
/// Produced once per successfully loaded path. After the load stage it is
/// shared read-only behind an `Arc`, so overlapping batches point at the
/// same buffer.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Source file
    pub path: PathBuf,
    /// EXIF capture time, when it was requested and present
    pub captured_at: Option<NaiveDateTime>,
    /// Normalized RGB pixels
    pub pixels: RgbImage,
}

impl LoadedImage {
    pub fn new(path: impl Into<PathBuf>, pixels: RgbImage) -> Self {
        Self {
            path: path.into(),
            captured_at: None,
            pixels,
        }
    }

    pub fn with_capture_time(mut self, captured_at: Option<NaiveDateTime>) -> Self {
        self.captured_at = captured_at;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StitchInput for LoadedImage {
    fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Output of a successful stitch
#[derive(Debug, Clone)]
pub struct Panorama {
    /// Batch this panorama was stitched from (`None` for the final merge)
    pub batch: Option<usize>,
    /// Stitched pixels
    pub pixels: RgbImage,
}

impl Panorama {
    /// A partial panorama produced by one batch
    pub fn partial(batch: usize, pixels: RgbImage) -> Self {
        Self {
            batch: Some(batch),
            pixels,
        }
    }

    /// The final merged panorama
    pub fn merged(pixels: RgbImage) -> Self {
        Self {
            batch: None,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// xxh3 digest over dimensions and raw pixels.
    ///
    /// Equal fingerprints across runs mean bit-identical output.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&self.pixels.width().to_le_bytes());
        hasher.update(&self.pixels.height().to_le_bytes());
        hasher.update(self.pixels.as_raw());
        hasher.digest()
    }
}

impl StitchInput for Panorama {
    fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}
