//! photonscope CLI
//!
//! Inspects photon time-tag files, exports binned traces and records
//! screening decisions from the command line.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use photonscope_core::{build_traces, trace_title, Dataset, TraceOptions};
use photonscope_io::annotations::DEFAULT_RESULTS_FILE;
use photonscope_io::registry::path_suffix;
use photonscope_io::{
    builtin_loader, Annotation, AnnotationStore, LoadOptions, Loader, LoaderRegistry,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    PhotonIo(#[from] photonscope_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] photonscope_core::Error),

    #[error("unknown loader '{0}' (expected ni-binary, spc or hdf5)")]
    UnknownLoader(String),

    #[error("{failed} of {total} file(s) failed to load")]
    Failed { failed: usize, total: usize },
}

/// Inspect and screen time-tagged single-photon data.
#[derive(Parser)]
#[command(name = "photonscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seconds per tick, overriding file values and format defaults
    #[arg(long, global = true)]
    timing_resolution: Option<f64>,

    /// JSON file with load options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Force a loader instead of dispatching by suffix (ni-binary, spc, hdf5)
    #[arg(long, global = true)]
    loader: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of one or more files
    Info {
        /// Input files
        #[arg(required = true)]
        input: Vec<PathBuf>,
    },

    /// Bin a file into per-detector intensity traces
    Trace {
        /// Input file
        input: PathBuf,

        /// Bin width in milliseconds
        #[arg(short, long, default_value = "10.0")]
        bin_width_ms: f64,

        /// Detector channel to include (repeatable; default all)
        #[arg(short, long)]
        channel: Vec<u8>,

        /// Maximum points per trace before decimation
        #[arg(long, default_value = "200000")]
        max_points: usize,

        /// Write the traces as CSV instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered file suffixes
    Loaders,

    /// Record a screening decision for a file
    Annotate {
        /// File being annotated
        input: PathBuf,

        /// Mark the file as kept
        #[arg(short, long)]
        keep: bool,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,

        /// Bin width the file was reviewed at (ms)
        #[arg(short, long, default_value = "10.0")]
        bin_width_ms: f64,

        /// Results CSV
        #[arg(short, long, default_value = DEFAULT_RESULTS_FILE)]
        results: PathBuf,
    },
}

fn load_options(cli: &Cli) -> Result<LoadOptions> {
    let mut options = match &cli.config {
        Some(path) => LoadOptions::from_file(path)?,
        None => LoadOptions::default(),
    };
    if let Some(resolution) = cli.timing_resolution {
        options.timing_resolution = Some(resolution);
    }
    Ok(options)
}

fn forced_loader(cli: &Cli) -> Result<Option<Loader>> {
    cli.loader
        .as_deref()
        .map(|name| builtin_loader(name).ok_or_else(|| CliError::UnknownLoader(name.to_string())))
        .transpose()
}

fn load(
    registry: &LoaderRegistry,
    loader: Option<&Loader>,
    path: &Path,
    options: &LoadOptions,
) -> Result<Dataset> {
    let dataset = match loader {
        Some(loader) => LoaderRegistry::load_with(path, loader, options)?,
        None => registry.load(path, options)?,
    };
    Ok(dataset)
}

fn print_info(ds: &Dataset) -> Result<()> {
    let events = ds.events();
    println!("Events: {}", events.len());
    match events.timing_resolution() {
        Some(res) => {
            println!("Timing resolution: {:e} s", res);
            println!(
                "Duration: {:.6} s",
                events.duration_ticks() as f64 * res
            );
        }
        None => println!("Timing resolution: (unset)"),
    }
    println!("Time ordered: {}", events.is_time_ordered());
    if events.has_detectors() {
        for (detector, ticks) in events.by_detector()? {
            println!("  detector {}: {} events", detector, ticks.len());
        }
    }
    if events.has_phases() {
        println!("Phases: present");
    }
    for (key, value) in ds.meta.iter() {
        println!("  {} = {}", key, value);
    }
    if let Some(edges) = ds.provenance.reference_edges() {
        println!("Reference edges: {}", edges.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = load_options(&cli)?;
    let loader = forced_loader(&cli)?;
    let registry = LoaderRegistry::with_builtin_loaders();

    match cli.command {
        Commands::Info { input } => {
            let mut failed = 0usize;
            for path in &input {
                println!("File: {}", path.display());
                match load(&registry, loader.as_ref(), path, &options) {
                    Ok(ds) => print_info(&ds)?,
                    Err(e) => {
                        failed += 1;
                        eprintln!("  error: {}", e);
                    }
                }
                println!();
            }
            if failed > 0 {
                return Err(CliError::Failed {
                    failed,
                    total: input.len(),
                });
            }
        }

        Commands::Trace {
            input,
            bin_width_ms,
            channel,
            max_points,
            output,
        } => {
            let ds = load(&registry, loader.as_ref(), &input, &options)?;

            let mut trace_options = TraceOptions::default()
                .with_bin_width_ms(bin_width_ms)
                .with_max_points(max_points);
            if !channel.is_empty() {
                trace_options = trace_options.with_channels(channel);
            }
            let traces = build_traces(ds.events(), &trace_options)?;

            println!("{}", trace_title(ds.source(), bin_width_ms, true));
            match output {
                Some(path) => {
                    let mut writer = BufWriter::new(File::create(&path)?);
                    writeln!(writer, "trace,time_s,counts")?;
                    for trace in &traces {
                        for (t, c) in trace.centers_s.iter().zip(&trace.counts) {
                            writeln!(writer, "{},{},{}", trace.name, t, c)?;
                        }
                    }
                    writer.flush()?;
                    println!("Wrote {} trace(s) to {}", traces.len(), path.display());
                }
                None => {
                    for trace in &traces {
                        let peak = trace.counts.iter().copied().max().unwrap_or(0);
                        println!(
                            "{:<16} bins={:<8} total={:<10} peak={}",
                            trace.name,
                            trace.counts.len(),
                            trace.total(),
                            peak
                        );
                    }
                }
            }
        }

        Commands::Loaders => {
            for suffix in registry.suffixes() {
                println!("{}", suffix);
            }
        }

        Commands::Annotate {
            input,
            keep,
            note,
            bin_width_ms,
            results,
        } => {
            let mut store = AnnotationStore::open(&results)?;
            let loader_hint = if path_suffix(&input).is_empty() {
                "ni_binary"
            } else {
                ""
            };
            // Self-describing formats record the resolution stored in the file.
            let resolution = match options.timing_resolution {
                Some(resolution) => resolution,
                None if matches!(path_suffix(&input).as_str(), "" | ".bin") => {
                    photonscope_io::loaders::DEFAULT_TIMING_RESOLUTION
                }
                None => registry
                    .load(&input, &options)?
                    .events()
                    .timing_resolution()
                    .unwrap_or(f64::NAN),
            };
            store.upsert(
                Annotation::new(input.display().to_string(), keep, bin_width_ms, resolution)
                    .with_note(note)
                    .with_loader_hint(loader_hint),
            );
            store.save()?;
            println!(
                "Saved annotation for {} to {} ({} entries)",
                input.display(),
                results.display(),
                store.len()
            );
        }
    }

    Ok(())
}
