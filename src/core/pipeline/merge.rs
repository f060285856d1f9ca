//! Final merge of the surviving partial panoramas.

use crate::core::engine::{StitchEngine, StitchOutcome};
use crate::core::image::{Panorama, StitchInput};
use crate::error::FailureCode;
use image::RgbImage;

/// Merge the survivors with a single engine call.
///
/// Fewer than two survivors cannot be stitched and short-circuit to
/// `NeedMoreImages` without touching the engine. Survivors are passed in the
/// order the stitch stage collected them. The merge is flat: one level of
/// hierarchy, no pairwise pre-merging or re-ordering on failure.
pub fn merge(engine: &dyn StitchEngine, panoramas: &[Panorama]) -> StitchOutcome {
    if panoramas.len() < 2 {
        return Err(FailureCode::NeedMoreImages);
    }

    let inputs: Vec<&RgbImage> = panoramas.iter().map(StitchInput::pixels).collect();
    engine.stitch(&inputs)
}
