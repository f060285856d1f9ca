//! # CLI Module
//!
//! Command-line interface for the panorama stitcher.
//!
//! ## Usage
//! ```bash
//! # Stitch a directory into finalStitchedOutput.png
//! pano-stitch stitch "unstitched images"
//!
//! # Larger batches with more shared images
//! pano-stitch stitch ~/Trip --batch-size 6 --overlap 2 -o trip.png
//!
//! # Order by EXIF capture time instead of file name
//! pano-stitch stitch ~/Trip --order capture-time
//!
//! # JSON report
//! pano-stitch stitch ~/Trip --output-format json
//!
//! # Show the batch layout without decoding anything
//! pano-stitch plan ~/Trip
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use panorama_stitcher::core::discovery::{DiscoveryConfig, ImageDiscovery, WalkDirDiscovery};
use panorama_stitcher::core::loader::SortOrder;
use panorama_stitcher::core::output::{FileSink, DEFAULT_OUTPUT};
use panorama_stitcher::core::partition::{dropped_trailing, plan, PartitionParams};
use panorama_stitcher::core::pipeline::{Pipeline, PipelineResult, StageTimings};
use panorama_stitcher::error::Result;
use panorama_stitcher::events::{
    null_sender, Event, EventChannel, LoadEvent, PipelineEvent, StitchEvent,
};
use std::path::{Path, PathBuf};
use std::thread;

/// Panorama Stitcher - stitch overlapping photos in parallel batches
#[derive(Parser, Debug)]
#[command(name = "pano-stitch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stitch photos into a single panorama
    Stitch {
        /// Directories or image files to stitch
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Where to write the panorama (format follows the extension)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Images per batch (at least 2)
        #[arg(long, default_value = "4")]
        batch_size: usize,

        /// Images shared by neighbouring batches (less than batch size)
        #[arg(long, default_value = "1")]
        overlap: usize,

        /// Working width every photo is resized to
        #[arg(long, default_value = "640")]
        width: u32,

        /// Working height every photo is resized to
        #[arg(long, default_value = "480")]
        height: u32,

        /// Worker threads (default: available cores, at most 8)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Order of the photos in the panorama
        #[arg(long, default_value = "name")]
        order: Order,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Report format
        #[arg(long, default_value = "pretty")]
        output_format: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how photos would be batched, without decoding them
    Plan {
        /// Directories or image files to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Images per batch (at least 2)
        #[arg(long, default_value = "4")]
        batch_size: usize,

        /// Images shared by neighbouring batches (less than batch size)
        #[arg(long, default_value = "1")]
        overlap: usize,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Report format
        #[arg(long, default_value = "pretty")]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Order {
    /// File path order (default)
    Name,
    /// EXIF capture time, file path as tie-break
    CaptureTime,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Name => SortOrder::FileName,
            Order::CaptureTime => SortOrder::CaptureTime,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Options for the stitch command
struct StitchArgs {
    paths: Vec<PathBuf>,
    output: PathBuf,
    batch_size: usize,
    overlap: usize,
    width: u32,
    height: u32,
    workers: Option<usize>,
    order: SortOrder,
    recursive: bool,
    include_hidden: bool,
    format: OutputFormat,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stitch {
            paths,
            output,
            batch_size,
            overlap,
            width,
            height,
            workers,
            order,
            recursive,
            include_hidden,
            output_format,
            verbose,
        } => {
            panorama_stitcher::init_tracing(if verbose { "debug" } else { "warn" });
            run_stitch(StitchArgs {
                paths,
                output,
                batch_size,
                overlap,
                width,
                height,
                workers,
                order: order.into(),
                recursive,
                include_hidden,
                format: output_format,
                verbose,
            })
        }
        Commands::Plan {
            paths,
            batch_size,
            overlap,
            recursive,
            include_hidden,
            output_format,
        } => {
            panorama_stitcher::init_tracing("warn");
            run_plan(
                paths,
                PartitionParams::new(batch_size, overlap)?,
                recursive,
                include_hidden,
                output_format,
            )
        }
    }
}

fn run_stitch(args: StitchArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.format, OutputFormat::Pretty);

    // Print header
    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Panorama Stitcher").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Build pipeline
    let mut builder = Pipeline::builder()
        .roots(args.paths)
        .batch_size(args.batch_size)
        .overlap(args.overlap)
        .resolution(args.width, args.height)
        .sort_order(args.order)
        .recursive(args.recursive)
        .include_hidden(args.include_hidden)
        .sink(FileSink::new(&args.output));
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let pipeline = builder.build()?;

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so the channel never backs up
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Load(LoadEvent::Started { total_images }) => {
                    pb.set_length(total_images as u64);
                    pb.set_position(0);
                }
                Event::Load(LoadEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "Loading {}",
                            p.current_path.file_name().unwrap_or_default().to_string_lossy()
                        ));
                    }
                }
                Event::Stitch(StitchEvent::Started { total_batches }) => {
                    pb.set_length(total_batches as u64);
                    pb.set_position(0);
                }
                Event::Stitch(StitchEvent::BatchStitched { completed, .. }) => {
                    pb.set_position(completed as u64);
                }
                Event::Stitch(StitchEvent::BatchFailed {
                    batch, code, completed, ..
                }) => {
                    pb.set_position(completed as u64);
                    if verbose {
                        pb.println(format!(
                            "  {} batch {} failed: {}",
                            style("!").yellow(),
                            batch,
                            code
                        ));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match args.format {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result),
    }

    result.into_written()?;
    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    let report = &result.report;
    term.write_line("").ok();

    match &result.outcome {
        Ok(panorama) => {
            term.write_line(&format!(
                "{} Panorama Complete",
                style("✓").green().bold()
            ))
            .ok();
            term.write_line("").ok();
            term.write_line(&format!(
                "  {} x {} pixels",
                style(panorama.width()).cyan(),
                style(panorama.height()).cyan()
            ))
            .ok();
            if let Some(path) = &report.output {
                term.write_line(&format!("  written to {}", style(path).yellow()))
                    .ok();
            }
            if let Some(error) = &report.output_error {
                term.write_line(&format!(
                    "  {} not written: {}",
                    style("✗").red(),
                    error
                ))
                .ok();
            }
        }
        Err(failure) => {
            term.write_line(&format!(
                "{} Stitching Failed: {}",
                style("✗").red().bold(),
                failure
            ))
            .ok();
            if let Some(code) = failure.failure_code() {
                term.write_line(&format!("  {}", style(code.hint()).dim())).ok();
            }
        }
    }

    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images loaded, {} skipped",
        style(report.loaded).cyan(),
        style(report.load_failures.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} of {} batches stitched",
        style(report.survivors).cyan(),
        style(report.batches.len()).cyan()
    ))
    .ok();
    term.write_line(&format!("  {}", finished_line(&report.timings)))
        .ok();

    if verbose {
        term.write_line(&format!(
            "  {}",
            style(format!(
                "discover {}ms, load {}ms, stitch {}ms, merge {}ms",
                report.timings.discover_ms,
                report.timings.load_ms,
                report.timings.stitch_ms,
                report.timings.merge_ms
            ))
            .dim()
        ))
        .ok();
    }

    if !report.load_failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Skipped Images:").bold().underlined()))
            .ok();
        for failure in &report.load_failures {
            term.write_line(&format!(
                "  {} {}: {}",
                style("○").dim(),
                failure.path.display(),
                failure.reason
            ))
            .ok();
        }
    }

    if !report.batch_failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Failed Batches:").bold().underlined()))
            .ok();
        for failure in &report.batch_failures {
            term.write_line(&format!(
                "  {} {}",
                style(format!("Batch {}:", failure.index)).bold(),
                style(failure.code).yellow()
            ))
            .ok();
            for path in &failure.paths {
                term.write_line(&format!("    {} {}", style("○").dim(), display_name(path)))
                    .ok();
            }
        }
    }

    if !report.dropped_trailing.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} {} trailing image(s) did not fill a batch and were left out",
            style("!").yellow(),
            report.dropped_trailing.len()
        ))
        .ok();
    }
}

fn print_json_results(result: &PipelineResult) {
    let panorama = result.panorama().map(|p| {
        serde_json::json!({
            "width": p.width(),
            "height": p.height(),
            "output": result.report.output,
        })
    });

    let output = serde_json::json!({
        "success": result.is_success(),
        "panorama": panorama,
        "report": result.report,
    });

    if let Ok(text) = serde_json::to_string_pretty(&output) {
        println!("{}", text);
    }
}

fn run_plan(
    paths: Vec<PathBuf>,
    params: PartitionParams,
    recursive: bool,
    include_hidden: bool,
    format: OutputFormat,
) -> Result<()> {
    let discovery = WalkDirDiscovery::new(DiscoveryConfig {
        include_hidden,
        max_depth: if recursive { None } else { Some(1) },
        ..DiscoveryConfig::default()
    });
    let found = discovery.discover(&paths, &null_sender())?;
    let layout = plan(found.paths.len(), &params);
    let dropped = dropped_trailing(found.paths.len(), &params);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "images": found.paths.len(),
                "batch_size": params.batch_size(),
                "overlap": params.overlap(),
                "batches": layout.iter().enumerate().map(|(index, range)| {
                    serde_json::json!({
                        "index": index,
                        "start": range.start,
                        "paths": &found.paths[range.clone()],
                    })
                }).collect::<Vec<_>>(),
                "dropped_trailing": &found.paths[found.paths.len() - dropped..],
                "errors": found.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            if let Ok(text) = serde_json::to_string_pretty(&output) {
                println!("{}", text);
            }
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!(
                "{} images, batch size {}, overlap {}",
                style(found.paths.len()).cyan(),
                params.batch_size(),
                params.overlap()
            ))
            .ok();
            term.write_line("").ok();

            for (index, range) in layout.iter().enumerate() {
                term.write_line(&format!(
                    "  {} images {}..{}",
                    style(format!("Batch {}:", index)).bold(),
                    range.start,
                    range.end
                ))
                .ok();
                for path in &found.paths[range.clone()] {
                    term.write_line(&format!("    {}", display_name(path))).ok();
                }
            }

            if dropped > 0 {
                term.write_line(&format!(
                    "  {} last {} image(s) would be left out",
                    style("!").yellow(),
                    dropped
                ))
                .ok();
            }
            if layout.len() < 2 {
                term.write_line(&format!(
                    "  {} fewer than two batches; the final merge needs at least two",
                    style("!").yellow()
                ))
                .ok();
            }
            for error in &found.errors {
                term.write_line(&format!("  {} {}", style("✗").red(), error)).ok();
            }
        }
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn finished_line(timings: &StageTimings) -> String {
    format!(
        "finished in {:.1}s (load and resize {:.1}s)",
        timings.total_ms as f64 / 1000.0,
        timings.load_ms as f64 / 1000.0
    )
}
