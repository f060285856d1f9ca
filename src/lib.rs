//! # Panorama Stitcher
//!
//! Builds one wide panorama from a directory of overlapping photos.
//!
//! ## Approach
//! Stitching many photos in one call is slow and brittle, so the photos are
//! cut into small overlapping batches that are stitched in parallel, and the
//! partial panoramas are then stitched once more into the final image. A
//! batch that fails is dropped; the run only fails when nothing is left to
//! merge.
//!
//! ## Architecture
//! - `core` - The stitching engine (discovery, loading, batching, merging)
//! - `events` - Event-driven progress reporting
//! - `error` - Error types and engine status codes

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{FailureCode, PipelineFailure, Result, StitcherError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG` takes
/// precedence over `default_level`. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
