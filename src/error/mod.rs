//! # Error Module
//!
//! Error types for the panorama stitcher.
//!
//! ## Taxonomy
//! - **Local failures** (`LoadError`, `FailureCode` on a batch) are recovered
//!   where they happen, excluded from the working set and aggregated into the
//!   pipeline report.
//! - **Stage-fatal failures** (`PipelineFailure`) stop the pipeline at a stage
//!   boundary and carry a human-readable cause category.
//! - **Engine status codes** (`FailureCode`) are preserved verbatim so an
//!   operator can tell "add more photos" apart from "geometry could not be solved".

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum StitcherError {
    #[error("Discovery error: {0}")]
    Discover(#[from] DiscoverError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineFailure),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Panorama was stitched but could not be written: {0}")]
    NotWritten(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while discovering input images
#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Input not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while loading a single image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized image format: {path}")]
    UnrecognizedFormat { path: PathBuf },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to resize image {path}: {source}")]
    Resize {
        path: PathBuf,
        #[source]
        source: ResizeError,
    },
}

impl LoadError {
    /// The file this error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. }
            | LoadError::UnrecognizedFormat { path }
            | LoadError::Decode { path, .. }
            | LoadError::EmptyImage { path }
            | LoadError::Resize { path, .. } => path,
        }
    }
}

/// Errors from the SIMD resizer
#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel buffer rejected: {0}")]
    Buffer(String),

    #[error("resize failed: {0}")]
    Resize(String),
}

/// Status reported by a stitch engine for an unsuccessful stitch.
///
/// Numeric statuses follow the usual stitcher convention: `0` is success,
/// `1` need more images, `2` homography estimation failed, `3` camera
/// parameter adjustment failed. Anything else is carried as `Other`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    #[error("need more images")]
    NeedMoreImages,

    #[error("homography estimation failed")]
    HomographyEstimationFailed,

    #[error("camera parameters adjustment failed")]
    CameraParameterAdjustmentFailed,

    #[error("stitch engine reported status {0}")]
    Other(i32),
}

impl FailureCode {
    /// Numeric engine status for this failure
    pub fn status(&self) -> i32 {
        match self {
            FailureCode::NeedMoreImages => 1,
            FailureCode::HomographyEstimationFailed => 2,
            FailureCode::CameraParameterAdjustmentFailed => 3,
            FailureCode::Other(code) => *code,
        }
    }

    /// Operator-facing hint on what to do about this failure
    pub fn hint(&self) -> &'static str {
        match self {
            FailureCode::NeedMoreImages => "Need more images with better overlap.",
            FailureCode::HomographyEstimationFailed => {
                "Homography estimation failed. The images could not be aligned."
            }
            FailureCode::CameraParameterAdjustmentFailed => {
                "Camera parameters adjustment failed."
            }
            FailureCode::Other(_) => "The stitch engine reported an unexpected status.",
        }
    }
}

/// Stage-fatal conditions that terminate the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineFailure {
    #[error("no input images found")]
    NoInputs,

    #[error("not enough images to stitch ({loaded} loaded, at least 2 required)")]
    NotEnoughImages { loaded: usize },

    #[error("no batches could be formed from {images} images")]
    NoBatches { images: usize },

    #[error("all {failed} batches failed to stitch")]
    AllBatchesFailed { failed: usize },

    #[error("final merge failed: {0}")]
    MergeFailed(#[source] FailureCode),
}

impl PipelineFailure {
    /// Short cause category for reports and exit messages
    pub fn category(&self) -> &'static str {
        match self {
            PipelineFailure::NoInputs => "no inputs",
            PipelineFailure::NotEnoughImages { .. } => "insufficient images",
            PipelineFailure::NoBatches { .. } => "no batches",
            PipelineFailure::AllBatchesFailed { .. } => "all batches failed",
            PipelineFailure::MergeFailed(_) => "merge failed",
        }
    }

    /// The engine status behind this failure, if any
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            PipelineFailure::MergeFailed(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors that occur while persisting the final panorama
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Invalid pipeline configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid batch size: {value} (must be at least 2)")]
    InvalidBatchSize { value: usize },

    #[error("Invalid overlap: {overlap} (must be less than batch size {batch_size})")]
    InvalidOverlap { overlap: usize, batch_size: usize },

    #[error("Invalid target resolution: {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid worker count: 0 (must be at least 1)")]
    InvalidWorkers,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, StitcherError>;
