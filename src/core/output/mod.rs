//! # Output Module
//!
//! Where the final panorama goes.
//!
//! A sink failure never invalidates the panorama: the pipeline records the
//! error in its report and still returns the stitched image.

use crate::core::image::Panorama;
use crate::error::OutputError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Default file name for the final panorama
pub const DEFAULT_OUTPUT: &str = "finalStitchedOutput.png";

/// Trait for panorama sinks
pub trait PanoramaSink: Send + Sync {
    /// Persist (or otherwise consume) the final panorama
    fn write(&self, panorama: &Panorama) -> Result<(), OutputError>;

    /// Human-readable destination for reports
    fn describe(&self) -> String;
}

impl<S: PanoramaSink + ?Sized> PanoramaSink for Arc<S> {
    fn write(&self, panorama: &Panorama) -> Result<(), OutputError> {
        (**self).write(panorama)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Writes the panorama to disk, encoding by file extension
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl PanoramaSink for FileSink {
    fn write(&self, panorama: &Panorama) -> Result<(), OutputError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| OutputError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        panorama
            .pixels
            .save(&self.path)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => OutputError::Io {
                    path: self.path.clone(),
                    source,
                },
                other => OutputError::Encode {
                    path: self.path.clone(),
                    reason: other.to_string(),
                },
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the panorama in memory; handy for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    written: Mutex<Option<RgbImage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last panorama written, if any
    pub fn take(&self) -> Result<Option<RgbImage>, OutputError> {
        let mut slot = self.slot()?;
        Ok(slot.take())
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<RgbImage>>, OutputError> {
        self.written
            .lock()
            .map_err(|e| OutputError::Unavailable(e.to_string()))
    }
}

impl PanoramaSink for MemorySink {
    fn write(&self, panorama: &Panorama) -> Result<(), OutputError> {
        *self.slot()? = Some(panorama.pixels.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
