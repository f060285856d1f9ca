//! Pipeline execution implementation.

use super::load::{LoadFailure, LoadStage};
use super::merge::merge;
use super::pool::WorkerPool;
use super::stitch::{FailedBatch, StitchStage, StitchStageOutput};
use crate::core::discovery::{DiscoveryConfig, ImageDiscovery, WalkDirDiscovery};
use crate::core::engine::{StitchEngine, TranslationStitcher};
use crate::core::image::{LoadedImage, Panorama, Resolution};
use crate::core::loader::{FileImageLoader, ImageLoader, SortOrder};
use crate::core::output::PanoramaSink;
use crate::core::partition::{partition, ImageBatch, PartitionParams};
use crate::error::{ConfigError, FailureCode, PipelineFailure, StitcherError};
use crate::events::{
    null_sender, Event, EventSender, LoadEvent, MergeEvent, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directories (or single files) to read from
    pub roots: Vec<PathBuf>,
    /// Batch size and overlap
    pub partition: PartitionParams,
    /// Every loaded image is resized to this
    pub resolution: Resolution,
    /// Worker threads for the load and stitch stages
    pub workers: usize,
    /// Order of images before partitioning
    pub sort_order: SortOrder,
    /// Discovery configuration
    pub discovery: DiscoveryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            partition: PartitionParams::default(),
            resolution: Resolution::default(),
            workers: WorkerPool::default_workers(),
            sort_order: SortOrder::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

/// Where a batch sat in the sorted image list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchLayout {
    pub index: usize,
    pub start: usize,
    pub len: usize,
}

impl From<&ImageBatch> for BatchLayout {
    fn from(batch: &ImageBatch) -> Self {
        Self {
            index: batch.index,
            start: batch.start,
            len: batch.len(),
        }
    }
}

/// A batch the engine rejected, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub paths: Vec<PathBuf>,
    pub code: FailureCode,
}

impl From<FailedBatch> for BatchFailure {
    fn from(failed: FailedBatch) -> Self {
        Self {
            index: failed.batch.index,
            paths: failed.batch.paths(),
            code: failed.code,
        }
    }
}

/// The failure that stopped the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalFailure {
    pub category: String,
    pub message: String,
    pub code: Option<FailureCode>,
}

impl From<&PipelineFailure> for TerminalFailure {
    fn from(failure: &PipelineFailure) -> Self {
        Self {
            category: failure.category().to_string(),
            message: failure.to_string(),
            code: failure.failure_code(),
        }
    }
}

/// Wall-clock time per stage, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageTimings {
    pub discover_ms: u64,
    /// Decode plus resize
    pub load_ms: u64,
    pub stitch_ms: u64,
    pub merge_ms: u64,
    pub total_ms: u64,
}

/// Everything that happened during a run, successful or not
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Name of the stitch engine
    pub engine: String,
    /// Candidate paths found by discovery
    pub discovered: usize,
    /// Non-fatal discovery errors
    pub discovery_errors: Vec<String>,
    /// Images that loaded successfully
    pub loaded: usize,
    /// Images that failed to load
    pub load_failures: Vec<LoadFailure>,
    /// Batch layout over the sorted images
    pub batches: Vec<BatchLayout>,
    /// Loaded images that no batch covers
    pub dropped_trailing: Vec<PathBuf>,
    /// Batches that stitched
    pub survivors: usize,
    /// Batches that did not
    pub batch_failures: Vec<BatchFailure>,
    /// Where the panorama was written
    pub output: Option<String>,
    /// Why the panorama could not be written
    pub output_error: Option<String>,
    /// xxh3 fingerprint of the final panorama, hex encoded
    pub fingerprint: Option<String>,
    /// Set when the run failed
    pub failure: Option<TerminalFailure>,
    pub timings: StageTimings,
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// The final panorama, or the stage-fatal condition that prevented it
    pub outcome: Result<Panorama, PipelineFailure>,
    /// Aggregate report
    pub report: PipelineReport,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn panorama(&self) -> Option<&Panorama> {
        self.outcome.as_ref().ok()
    }

    pub fn into_result(self) -> Result<Panorama, PipelineFailure> {
        self.outcome
    }

    /// Like `into_result`, but a panorama the sink failed to write is also
    /// an error. Pipeline failures take precedence.
    pub fn into_written(self) -> crate::error::Result<Panorama> {
        let panorama = self.outcome?;
        match self.report.output_error {
            Some(reason) => Err(StitcherError::NotWritten(reason)),
            None => Ok(panorama),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    roots: Vec<PathBuf>,
    batch_size: usize,
    overlap: usize,
    width: u32,
    height: u32,
    workers: usize,
    sort_order: SortOrder,
    discovery_config: DiscoveryConfig,
    loader: Option<Box<dyn ImageLoader>>,
    engine: Option<Box<dyn StitchEngine>>,
    discovery: Option<Box<dyn ImageDiscovery>>,
    sink: Option<Box<dyn PanoramaSink>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            roots: defaults.roots,
            batch_size: defaults.partition.batch_size(),
            overlap: defaults.partition.overlap(),
            width: defaults.resolution.width,
            height: defaults.resolution.height,
            workers: defaults.workers,
            sort_order: defaults.sort_order,
            discovery_config: defaults.discovery,
            loader: None,
            engine: None,
            discovery: None,
            sink: None,
        }
    }

    /// Directories or files to read from
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    /// Images per batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Images shared by adjacent batches
    pub fn overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Working resolution for loaded images
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Worker threads for the load and stitch stages
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.discovery_config.max_depth = if recursive { None } else { Some(1) };
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.discovery_config.include_hidden = include;
        self
    }

    /// Override the accepted file extensions
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.discovery_config.extensions = Some(extensions);
        self
    }

    /// Replace the file loader
    pub fn loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Replace the stitch engine
    pub fn engine(mut self, engine: impl StitchEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Replace filesystem discovery
    pub fn discovery(mut self, discovery: impl ImageDiscovery + 'static) -> Self {
        self.discovery = Some(Box::new(discovery));
        self
    }

    /// Where to send the final panorama
    pub fn sink(mut self, sink: impl PanoramaSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let config = PipelineConfig {
            roots: self.roots,
            partition: PartitionParams::new(self.batch_size, self.overlap)?,
            resolution: Resolution::new(self.width, self.height)?,
            workers: self.workers,
            sort_order: self.sort_order,
            discovery: self.discovery_config,
        };
        let pool = WorkerPool::new(config.workers)?;

        let loader = self.loader.unwrap_or_else(|| {
            Box::new(
                FileImageLoader::new(config.resolution)
                    .with_capture_time(config.sort_order.needs_capture_time()),
            )
        });
        let engine = self
            .engine
            .unwrap_or_else(|| Box::new(TranslationStitcher::default()));
        let discovery = self
            .discovery
            .unwrap_or_else(|| Box::new(WalkDirDiscovery::new(config.discovery.clone())));

        Ok(Pipeline {
            config,
            pool,
            loader,
            engine,
            discovery,
            sink: self.sink,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The hierarchical stitching pipeline
pub struct Pipeline {
    config: PipelineConfig,
    pool: WorkerPool,
    loader: Box<dyn ImageLoader>,
    engine: Box<dyn StitchEngine>,
    discovery: Box<dyn ImageDiscovery>,
    sink: Option<Box<dyn PanoramaSink>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> PipelineResult {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> PipelineResult {
        let start_time = Instant::now();
        let mut report = PipelineReport {
            engine: self.engine.name().to_string(),
            ..PipelineReport::default()
        };

        events.send(Event::Pipeline(PipelineEvent::Started));
        info!(
            roots = ?self.config.roots,
            batch_size = self.config.partition.batch_size(),
            overlap = self.config.partition.overlap(),
            resolution = %self.config.resolution,
            workers = self.pool.workers(),
            engine = self.engine.name(),
            "starting panorama pipeline"
        );

        let outcome = self.execute(events, &mut report);
        report.timings.total_ms = elapsed_ms(start_time);

        match &outcome {
            Ok(panorama) => {
                info!(
                    width = panorama.width(),
                    height = panorama.height(),
                    total_ms = report.timings.total_ms,
                    "panorama complete"
                );
                events.send(Event::Pipeline(PipelineEvent::Completed {
                    summary: PipelineSummary {
                        images_loaded: report.loaded,
                        batches: report.batches.len(),
                        survivors: report.survivors,
                        width: panorama.width(),
                        height: panorama.height(),
                        duration_ms: report.timings.total_ms,
                    },
                }));
            }
            Err(failure) => {
                warn!(category = failure.category(), "pipeline failed: {}", failure);
                report.failure = Some(TerminalFailure::from(failure));
                events.send(Event::Pipeline(PipelineEvent::Failed {
                    category: failure.category().to_string(),
                    message: failure.to_string(),
                }));
            }
        }

        PipelineResult { outcome, report }
    }

    fn execute(
        &self,
        events: &EventSender,
        report: &mut PipelineReport,
    ) -> Result<Panorama, PipelineFailure> {
        // Phase 1: Discovery
        enter_phase(events, PipelinePhase::Discovering);
        let started = Instant::now();
        let paths = match self.discovery.discover(&self.config.roots, events) {
            Ok(found) => {
                report
                    .discovery_errors
                    .extend(found.errors.iter().map(ToString::to_string));
                found.paths
            }
            Err(e) => {
                warn!("discovery failed: {}", e);
                report.discovery_errors.push(e.to_string());
                Vec::new()
            }
        };
        report.timings.discover_ms = elapsed_ms(started);
        report.discovered = paths.len();
        info!(images = paths.len(), "discovered candidate images");

        if paths.is_empty() {
            return Err(PipelineFailure::NoInputs);
        }

        // Phase 2: Load and resize
        enter_phase(events, PipelinePhase::Loading);
        let started = Instant::now();
        let loaded = LoadStage::new(self.loader.as_ref(), &self.pool, self.config.sort_order)
            .run(paths, events);
        report.timings.load_ms = elapsed_ms(started);
        report.loaded = loaded.images.len();
        report.load_failures = loaded.failures;

        events.send(Event::Load(LoadEvent::Completed {
            loaded: report.loaded,
            failed: report.load_failures.len(),
            duration_ms: report.timings.load_ms,
        }));
        info!(
            loaded = report.loaded,
            failed = report.load_failures.len(),
            elapsed_ms = report.timings.load_ms,
            resident_bytes = report.loaded * self.config.resolution.buffer_bytes(),
            "loaded and resized images"
        );

        if loaded.images.len() < 2 {
            return Err(PipelineFailure::NotEnoughImages {
                loaded: loaded.images.len(),
            });
        }

        // Phase 3: Partition
        enter_phase(events, PipelinePhase::Partitioning);
        let images: Vec<Arc<LoadedImage>> = loaded.images.into_iter().map(Arc::new).collect();
        let batches = partition(&images, &self.config.partition);

        let covered = batches.last().map(|b| b.range().end).unwrap_or(0);
        report.dropped_trailing = images[covered..]
            .iter()
            .map(|i| i.path().to_path_buf())
            .collect();
        if !report.dropped_trailing.is_empty() {
            warn!(
                dropped = ?report.dropped_trailing,
                "trailing images do not fill a batch and are excluded"
            );
        }
        report.batches = batches.iter().map(BatchLayout::from).collect();
        debug!(batches = ?report.batches, "partitioned images");

        // The batches now hold the only references to the pixels
        drop(images);

        if batches.is_empty() {
            return Err(PipelineFailure::NoBatches {
                images: report.loaded,
            });
        }
        if batches.len() == 1 {
            warn!("only one batch formed; the final merge needs at least two partial panoramas");
        }

        // Phase 4: Stitch batches
        enter_phase(events, PipelinePhase::Stitching);
        let started = Instant::now();
        let stitched = StitchStage::new(self.engine.as_ref(), &self.pool).run(batches, events);
        report.timings.stitch_ms = elapsed_ms(started);

        let fatal = stitched.ensure_survivors();
        let StitchStageOutput { survivors, failures } = stitched;
        report.survivors = survivors.len();
        report.batch_failures = failures.into_iter().map(BatchFailure::from).collect();
        info!(
            survivors = report.survivors,
            failed = report.batch_failures.len(),
            elapsed_ms = report.timings.stitch_ms,
            "stitched batches"
        );
        fatal?;

        // Phase 5: Merge
        enter_phase(events, PipelinePhase::Merging);
        events.send(Event::Merge(MergeEvent::Started {
            inputs: survivors.len(),
        }));
        let started = Instant::now();
        let merged = merge(self.engine.as_ref(), &survivors);
        drop(survivors);
        report.timings.merge_ms = elapsed_ms(started);

        let pixels = match merged {
            Ok(pixels) => pixels,
            Err(code) => {
                warn!(status = code.status(), "final merge failed: {}", code);
                events.send(Event::Merge(MergeEvent::Failed { code }));
                return Err(PipelineFailure::MergeFailed(code));
            }
        };
        events.send(Event::Merge(MergeEvent::Completed {
            width: pixels.width(),
            height: pixels.height(),
        }));

        let panorama = Panorama::merged(pixels);
        report.fingerprint = Some(format!("{:016x}", panorama.fingerprint()));

        // Phase 6: Output
        if let Some(sink) = &self.sink {
            enter_phase(events, PipelinePhase::Writing);
            match sink.write(&panorama) {
                Ok(()) => {
                    info!(output = %sink.describe(), "panorama written");
                    report.output = Some(sink.describe());
                }
                Err(e) => {
                    warn!("failed to write panorama: {}", e);
                    report.output_error = Some(e.to_string());
                }
            }
        }

        Ok(panorama)
    }
}

fn enter_phase(events: &EventSender, phase: PipelinePhase) {
    debug!(%phase, "entering phase");
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
