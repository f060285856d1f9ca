//! # Loader Module
//!
//! Turns a file path into a `LoadedImage` at the working resolution.
//!
//! ## Steps
//! 1. Read the file (memory-mapped when at least 1MB)
//! 2. Reject files whose header is not a known image format
//! 3. Decode (zune-jpeg for JPEG, image crate otherwise)
//! 4. Resize to the fixed working resolution with fast_image_resize
//! 5. Optionally read the EXIF capture time for capture-order sorting
//!
//! Normalizing every photo to one resolution bounds the memory held by each
//! concurrently loaded image.

pub mod decode;
pub mod mmap;
pub mod resize;

pub use resize::FastResizer;

use crate::core::image::{LoadedImage, Resolution};
use crate::core::metadata;
use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Loads and normalizes one image.
///
/// Implement this trait to plug in another decoder, or a fake in tests.
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedImage, LoadError>;
}

/// Order applied to the loaded images before they are partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Lexicographic by path
    #[default]
    FileName,
    /// EXIF capture time, then path; photos without a timestamp go last
    CaptureTime,
}

impl SortOrder {
    /// Compare two loaded images under this order
    pub fn compare(&self, a: &LoadedImage, b: &LoadedImage) -> Ordering {
        match self {
            SortOrder::FileName => a.path.cmp(&b.path),
            SortOrder::CaptureTime => match (a.captured_at, b.captured_at) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.path.cmp(&b.path)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.path.cmp(&b.path),
            },
        }
    }

    /// Whether loaders need to read EXIF for this order
    pub fn needs_capture_time(&self) -> bool {
        matches!(self, SortOrder::CaptureTime)
    }
}

/// Loader for image files on disk
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    resolution: Resolution,
    read_capture_time: bool,
}

impl FileImageLoader {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            read_capture_time: false,
        }
    }

    /// Also extract the EXIF capture time
    pub fn with_capture_time(mut self, enabled: bool) -> Self {
        self.read_capture_time = enabled;
        self
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, LoadError> {
        let bytes = mmap::read_file_bytes(path)?;

        if !mmap::has_image_header(&bytes) {
            return Err(LoadError::UnrecognizedFormat {
                path: path.to_path_buf(),
            });
        }

        let decoded = decode::decode(path, &bytes)?;
        let pixels = FastResizer::new()
            .resize_rgb(&decoded, self.resolution.width, self.resolution.height)
            .map_err(|source| LoadError::Resize {
                path: path.to_path_buf(),
                source,
            })?;
        drop(decoded);

        let captured_at = if self.read_capture_time {
            metadata::capture_time(&bytes)
        } else {
            None
        };

        Ok(LoadedImage::new(path, pixels).with_capture_time(captured_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn image_at(path: &str, day: Option<u32>) -> LoadedImage {
        LoadedImage::new(path, RgbImage::new(1, 1)).with_capture_time(day.map(|d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        }))
    }

    #[test]
    fn file_name_order_is_lexicographic() {
        let a = image_at("/shots/a.jpg", Some(9));
        let b = image_at("/shots/b.jpg", Some(1));
        assert_eq!(SortOrder::FileName.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn capture_time_order_puts_untimed_last() {
        let mut images = vec![
            image_at("/shots/a.jpg", None),
            image_at("/shots/b.jpg", Some(3)),
            image_at("/shots/c.jpg", Some(1)),
            image_at("/shots/d.jpg", Some(3)),
        ];
        images.sort_by(|x, y| SortOrder::CaptureTime.compare(x, y));

        let names: Vec<_> = images
            .iter()
            .map(|i| i.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["c.jpg", "b.jpg", "d.jpg", "a.jpg"]);
    }

    #[test]
    fn loads_and_normalizes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 7]))
            .save(&path)
            .unwrap();

        let loader = FileImageLoader::new(Resolution::new(20, 10).unwrap());
        let loaded = loader.load(&path).unwrap();

        assert_eq!(loaded.pixels.dimensions(), (20, 10));
        assert_eq!(loaded.path, path);
        assert!(loaded.captured_at.is_none());
    }

    #[test]
    fn text_file_is_unrecognized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"this is not a valid image file").unwrap();

        let loader = FileImageLoader::new(Resolution::default());
        assert!(matches!(
            loader.load(&path),
            Err(LoadError::UnrecognizedFormat { .. })
        ));
    }
}
