//! # Discovery Module
//!
//! Finds the candidate source photos for a stitching run.
//!
//! A root may be a directory (listed non-recursively unless configured
//! otherwise) or a single image file. The returned paths are sorted and
//! de-duplicated. Unreadable entries and missing roots are recorded as
//! non-fatal errors; an empty result is handled by the pipeline as
//! "no inputs".
//!
//! ## Example
//! ```rust,ignore
//! use panorama_stitcher::core::discovery::{DiscoveryConfig, ImageDiscovery, WalkDirDiscovery};
//!
//! let discovery = WalkDirDiscovery::new(DiscoveryConfig::default());
//! let found = discovery.discover(&["unstitched images".into()], &null_sender())?;
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use walker::{DiscoveryConfig, WalkDirDiscovery};

use crate::error::DiscoverError;
use crate::events::EventSender;
use std::path::PathBuf;

/// Result of discovery
#[derive(Debug, Default)]
pub struct DiscoveryResult {
    /// Candidate image paths, sorted
    pub paths: Vec<PathBuf>,
    /// Non-fatal errors hit along the way
    pub errors: Vec<DiscoverError>,
}

/// Source of candidate image paths.
///
/// Implement this trait to feed the pipeline from somewhere other than the
/// filesystem (e.g., a fixed list in tests).
pub trait ImageDiscovery: Send + Sync {
    fn discover(
        &self,
        roots: &[PathBuf],
        events: &EventSender,
    ) -> Result<DiscoveryResult, DiscoverError>;
}
