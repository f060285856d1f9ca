//! Parallel stitch stage.

use super::pool::WorkerPool;
use crate::core::engine::StitchEngine;
use crate::core::image::{Panorama, StitchInput};
use crate::core::partition::ImageBatch;
use crate::error::{FailureCode, PipelineFailure};
use crate::events::{Event, EventSender, StitchEvent};
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A batch the engine could not stitch
#[derive(Debug, Clone)]
pub struct FailedBatch {
    pub batch: ImageBatch,
    pub code: FailureCode,
}

/// Survivors and failures, both in batch order
#[derive(Debug, Default)]
pub struct StitchStageOutput {
    pub survivors: Vec<Panorama>,
    pub failures: Vec<FailedBatch>,
}

impl StitchStageOutput {
    /// An empty survivor list is fatal for the pipeline
    pub fn ensure_survivors(&self) -> Result<(), PipelineFailure> {
        if self.survivors.is_empty() {
            return Err(PipelineFailure::AllBatchesFailed {
                failed: self.failures.len(),
            });
        }
        Ok(())
    }
}

/// Fans one engine call per batch out across the worker pool
pub struct StitchStage<'a> {
    engine: &'a dyn StitchEngine,
    pool: &'a WorkerPool,
}

impl<'a> StitchStage<'a> {
    pub fn new(engine: &'a dyn StitchEngine, pool: &'a WorkerPool) -> Self {
        Self { engine, pool }
    }

    /// Stitch every batch. Consumes the batches so that a successful batch
    /// releases its image references as soon as its panorama exists.
    pub fn run(&self, batches: Vec<ImageBatch>, events: &EventSender) -> StitchStageOutput {
        let total = batches.len();
        events.send(Event::Stitch(StitchEvent::Started {
            total_batches: total,
        }));

        let completed = AtomicUsize::new(0);
        let results = self.pool.map(batches, |batch| {
            let inputs: Vec<&RgbImage> = batch.images.iter().map(|i| i.pixels()).collect();
            let outcome = self.engine.stitch(&inputs);
            drop(inputs);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;

            match outcome {
                Ok(pixels) => {
                    tracing::debug!(
                        batch = batch.index,
                        width = pixels.width(),
                        height = pixels.height(),
                        "batch stitched"
                    );
                    events.send(Event::Stitch(StitchEvent::BatchStitched {
                        batch: batch.index,
                        completed: done,
                        total,
                    }));
                    Ok(Panorama::partial(batch.index, pixels))
                }
                Err(code) => {
                    tracing::warn!(
                        batch = batch.index,
                        status = code.status(),
                        "stitching failed for a batch: {}",
                        code
                    );
                    events.send(Event::Stitch(StitchEvent::BatchFailed {
                        batch: batch.index,
                        code,
                        completed: done,
                        total,
                    }));
                    Err(FailedBatch { batch, code })
                }
            }
        });

        let mut output = StitchStageOutput::default();
        for result in results {
            match result {
                Ok(panorama) => output.survivors.push(panorama),
                Err(failed) => output.failures.push(failed),
            }
        }

        events.send(Event::Stitch(StitchEvent::Completed {
            survivors: output.survivors.len(),
            failed: output.failures.len(),
        }));

        output
    }
}
