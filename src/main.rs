use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};

use brc_aggregate::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_LINE_BYTES};
use brc_aggregate::pipeline::DEFAULT_WORK_QUEUE_CAPACITY;
use brc_aggregate::{aggregate_file, render, Config, Format, Mode};

#[derive(Parser, Debug)]
#[command(name = "brc-aggregate")]
#[command(about = "Per-station min/mean/max over a KEY;VALUE measurements file")]
#[command(version)]
struct Args {
    /// Path to the measurements file
    #[arg(short, long)]
    file: PathBuf,

    /// Bytes per raw read
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Worker threads (defaults to available parallelism minus one)
    #[arg(long)]
    workers: Option<usize>,

    /// Chunks buffered between the reader and the workers
    #[arg(long, default_value_t = DEFAULT_WORK_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Longest line accepted before the run is aborted
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,

    #[arg(long, value_enum, default_value_t = CliMode::Streaming)]
    mode: CliMode,

    #[arg(long, value_enum, default_value_t = CliFormat::Braces)]
    format: CliFormat,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
    Streaming,
    Sequential,
    Mapped,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Streaming => Mode::Streaming,
            CliMode::Sequential => Mode::Sequential,
            CliMode::Mapped => Mode::Mapped,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    Braces,
    Lines,
}

impl From<CliFormat> for Format {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Braces => Format::Braces,
            CliFormat::Lines => Format::Lines,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = Config {
        chunk_size: args.chunk_size,
        workers: args.workers,
        work_queue_capacity: args.queue_capacity,
        max_line_bytes: args.max_line_bytes,
        mode: args.mode.into(),
    };
    info!(?config, file = %args.file.display(), "aggregating");

    let start = Instant::now();
    let summary = aggregate_file(&args.file, &config)
        .with_context(|| format!("aggregating {}", args.file.display()))?;
    let elapsed = start.elapsed();

    if summary.rejected > 0 {
        warn!(rejected = summary.rejected, "some lines were skipped");
    }
    println!("{}", render(&summary.stations, args.format.into()));
    info!(?elapsed, "elapsed time");
    Ok(())
}
