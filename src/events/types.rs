//! Event type definitions for progress reporting.

use crate::error::FailureCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the stitching pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Input discovery events
    Discover(DiscoverEvent),
    /// Parallel load stage events
    Load(LoadEvent),
    /// Parallel stitch stage events
    Stitch(StitchEvent),
    /// Final merge events
    Merge(MergeEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during input discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiscoverEvent {
    /// Discovery has started
    Started { roots: Vec<PathBuf> },
    /// A candidate image was found
    ImageFound { path: PathBuf },
    /// An entry could not be read but discovery continues
    Error { path: PathBuf, message: String },
    /// Discovery completed
    Completed { total_images: usize },
}

/// Events during the load stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoadEvent {
    /// Loading has started
    Started { total_images: usize },
    /// Progress update during loading
    Progress(LoadProgress),
    /// An image failed to load; it is excluded from stitching
    Failed { path: PathBuf, message: String },
    /// Loading completed
    Completed {
        loaded: usize,
        failed: usize,
        duration_ms: u64,
    },
}

/// Progress information during loading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Number of images attempted so far
    pub completed: usize,
    /// Total number of images to load
    pub total: usize,
    /// Image that just finished
    pub current_path: PathBuf,
}

/// Events during the stitch stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StitchEvent {
    /// Batch stitching has started
    Started { total_batches: usize },
    /// A batch stitched into a partial panorama
    BatchStitched {
        batch: usize,
        completed: usize,
        total: usize,
    },
    /// A batch failed; it is dropped from the merge
    BatchFailed {
        batch: usize,
        code: FailureCode,
        completed: usize,
        total: usize,
    },
    /// Batch stitching completed
    Completed { survivors: usize, failed: usize },
}

/// Events during the final merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MergeEvent {
    /// Merge has started
    Started { inputs: usize },
    /// Merge produced the final panorama
    Completed { width: u32, height: u32 },
    /// Merge failed
    Failed { code: FailureCode },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline produced a panorama
    Completed { summary: PipelineSummary },
    /// Pipeline stopped at a stage-fatal condition
    Failed { category: String, message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Discovering,
    Loading,
    Partitioning,
    Stitching,
    Merging,
    Writing,
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images that loaded successfully
    pub images_loaded: usize,
    /// Batches that were formed
    pub batches: usize,
    /// Batches that stitched successfully
    pub survivors: usize,
    /// Final panorama width in pixels
    pub width: u32,
    /// Final panorama height in pixels
    pub height: u32,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Discovering => write!(f, "Discovering"),
            PipelinePhase::Loading => write!(f, "Loading"),
            PipelinePhase::Partitioning => write!(f, "Partitioning"),
            PipelinePhase::Stitching => write!(f, "Stitching"),
            PipelinePhase::Merging => write!(f, "Merging"),
            PipelinePhase::Writing => write!(f, "Writing"),
        }
    }
}
