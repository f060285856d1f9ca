//! # Core Module
//!
//! The front-end agnostic stitching engine.
//!
//! ## Modules
//! - `discovery` - Finds candidate photos on disk
//! - `loader` - Decodes and resizes photos to the working resolution
//! - `metadata` - Reads EXIF capture times
//! - `partition` - Cuts the photo sequence into overlapping batches
//! - `engine` - The stitch engine boundary and the shipped translation engine
//! - `pipeline` - Orchestrates the full workflow
//! - `output` - Persists the final panorama

pub mod discovery;
pub mod engine;
pub mod image;
pub mod loader;
pub mod metadata;
pub mod output;
pub mod partition;
pub mod pipeline;

// Re-export commonly used types
pub use engine::{StitchEngine, StitchOutcome, TranslationStitcher};
pub use self::image::{LoadedImage, Panorama, Resolution};
pub use loader::{FileImageLoader, ImageLoader, SortOrder};
pub use output::{FileSink, PanoramaSink};
pub use partition::{ImageBatch, PartitionParams};
