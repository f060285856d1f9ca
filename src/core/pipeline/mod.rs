//! # Pipeline Module
//!
//! Orchestrates the hierarchical stitching workflow.
//!
//! ## Pipeline Stages
//! 1. **Discover** - Find candidate photos under the configured roots
//! 2. **Load** - Decode and resize every photo in parallel
//! 3. **Partition** - Cut the sorted photos into overlapping batches
//! 4. **Stitch** - Stitch every batch into a partial panorama in parallel
//! 5. **Merge** - Stitch the surviving partials into the final panorama
//! 6. **Write** - Hand the panorama to the configured sink
//!
//! ## Parallelism
//! The load and stitch stages share one bounded rayon pool. Each stage
//! drains completely before the next one starts.

mod executor;
mod load;
mod merge;
mod pool;
mod stitch;

pub use executor::{
    BatchFailure, BatchLayout, Pipeline, PipelineBuilder, PipelineConfig, PipelineReport,
    PipelineResult, StageTimings, TerminalFailure,
};
pub use load::{LoadFailure, LoadStage, LoadStageOutput};
pub use merge::merge;
pub use pool::{WorkerPool, MAX_DEFAULT_WORKERS};
pub use stitch::{FailedBatch, StitchStage, StitchStageOutput};
