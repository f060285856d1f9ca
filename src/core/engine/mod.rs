//! # Engine Module
//!
//! The stitch engine boundary.
//!
//! An engine turns an ordered list of at least two images into one image or
//! reports a `FailureCode`. It is called once per batch and once more for
//! the final merge; the pipeline never retries a failed call.
//!
//! ## Engines
//! - `TranslationStitcher` - translation-only alignment with feathered
//!   blending, for horizontally panned sequences

mod translation;

pub use translation::{TranslationConfig, TranslationStitcher};

use crate::error::FailureCode;
use image::RgbImage;

/// Outcome of one stitch call
pub type StitchOutcome = Result<RgbImage, FailureCode>;

/// Trait for stitch engine implementations
pub trait StitchEngine: Send + Sync {
    /// Stitch the images, in order, into one.
    fn stitch(&self, images: &[&RgbImage]) -> StitchOutcome;

    /// Short name for logs and reports
    fn name(&self) -> &'static str;
}
