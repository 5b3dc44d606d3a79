//! Producer → workers → reducer pipeline and the alternative execution modes.
//!
//! The streaming pipeline runs one producer thread that cuts the input into
//! newline-aligned chunks, `workers` threads that each fold chunks into a
//! private [`Summary`], and a reducer on the calling thread that merges the
//! partial summaries. The two bounded channels between them are the only
//! shared state.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::chunk::{ChunkSplitter, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_LINE_BYTES};
use crate::error::{Error, Result};
use crate::record::parse_record;
use crate::stats::{record_value, Summary};

pub const DEFAULT_WORK_QUEUE_CAPACITY: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Chunked reads fanned out to a worker pool over bounded channels.
    #[default]
    Streaming,
    /// Single pass; the first unparsable line aborts the run.
    Sequential,
    /// Memory-mapped file split into one range per worker, run on rayon.
    Mapped,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub chunk_size: usize,
    /// `None` picks one less than the available parallelism.
    pub workers: Option<usize>,
    pub work_queue_capacity: usize,
    pub max_line_bytes: usize,
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
            work_queue_capacity: DEFAULT_WORK_QUEUE_CAPACITY,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            mode: Mode::Streaming,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        if self.work_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "work queue capacity must be positive".into(),
            ));
        }
        if self.max_line_bytes == 0 {
            return Err(Error::InvalidConfig(
                "maximum line length must be positive".into(),
            ));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("worker count must be positive".into()));
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }
}

/// One unit of parallelism is left for the producer.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Aggregates the file at `path` with the mode selected in `config`.
pub fn aggregate_file(path: &Path, config: &Config) -> Result<Summary> {
    config.validate()?;
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    match config.mode {
        Mode::Streaming => aggregate_reader(file, config),
        Mode::Sequential => aggregate_strict(BufReader::with_capacity(config.chunk_size, file)),
        Mode::Mapped => aggregate_mapped(&file, config),
    }
}

/// Runs the streaming pipeline over any byte source.
pub fn aggregate_reader<R: Read + Send>(reader: R, config: &Config) -> Result<Summary> {
    config.validate()?;
    let workers = config.worker_count();
    let (chunk_tx, chunk_rx) = bounded::<Vec<u8>>(config.work_queue_capacity);
    let (partial_tx, partial_rx) = bounded::<Summary>(workers);
    let cancelled = AtomicBool::new(false);
    let cancelled = &cancelled;

    debug!(workers, chunk_size = config.chunk_size, "starting pipeline");

    thread::scope(|s| {
        let producer = s.spawn(move || produce(reader, config, chunk_tx, cancelled));

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let chunk_rx = chunk_rx.clone();
                let partial_tx = partial_tx.clone();
                s.spawn(move || work(id, chunk_rx, partial_tx, cancelled))
            })
            .collect();
        // The result channel closes once the last worker drops its sender.
        drop(chunk_rx);
        drop(partial_tx);

        let total = reduce(partial_rx);

        let produced = producer.join().map_err(|_| Error::WorkerPanicked)?;
        for handle in handles {
            handle.join().map_err(|_| Error::WorkerPanicked)?;
        }
        let chunks = produced?;

        info!(
            chunks,
            stations = total.stations.len(),
            records = total.records(),
            rejected = total.rejected,
            "pipeline finished"
        );
        Ok(total)
    })
}

fn produce<R: Read>(
    reader: R,
    config: &Config,
    chunk_tx: Sender<Vec<u8>>,
    cancelled: &AtomicBool,
) -> Result<u64> {
    let splitter = ChunkSplitter::new(reader, config.chunk_size).max_line_bytes(config.max_line_bytes);
    let mut sent = 0;
    for chunk in splitter {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                cancelled.store(true, Ordering::Relaxed);
                return Err(err);
            }
        };
        if chunk_tx.send(chunk).is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

fn work(id: usize, chunk_rx: Receiver<Vec<u8>>, partial_tx: Sender<Summary>, cancelled: &AtomicBool) {
    let mut local = Summary::default();
    let mut chunks = 0u64;
    for chunk in chunk_rx.iter() {
        if cancelled.load(Ordering::Relaxed) {
            debug!(worker = id, "cancelled");
            return;
        }
        local.absorb_chunk(&chunk);
        chunks += 1;
    }
    debug!(
        worker = id,
        chunks,
        stations = local.stations.len(),
        rejected = local.rejected,
        "worker done"
    );
    if partial_tx.send(local).is_err() {
        debug!(worker = id, "reducer gone, dropping partial result");
    }
}

fn reduce(partial_rx: Receiver<Summary>) -> Summary {
    let mut total = Summary::default();
    for partial in partial_rx.iter() {
        total.merge(partial);
    }
    total
}

/// Single-threaded pass in strict mode: any unparsable line is fatal.
pub fn aggregate_strict<R: BufRead>(mut reader: R) -> Result<Summary> {
    let mut summary = Summary::default();
    let mut buf = Vec::new();
    let mut line = 0u64;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line += 1;
        let text = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        if text.is_empty() || text == b"\r" {
            continue;
        }
        let (station, value) = parse_record(text).map_err(|source| Error::Record { line, source })?;
        record_value(&mut summary.stations, station, value);
    }
    info!(
        stations = summary.stations.len(),
        records = summary.records(),
        "sequential pass finished"
    );
    Ok(summary)
}

/// Maps `file` and processes one newline-aligned range per worker on rayon.
pub fn aggregate_mapped(file: &File, config: &Config) -> Result<Summary> {
    config.validate()?;
    if file.metadata()?.len() == 0 {
        return Ok(Summary::default());
    }
    // SAFETY: the input is opened read-only and is not expected to change
    // while it is being aggregated.
    let mmap = unsafe { Mmap::map(file)? };
    let ranges = split_ranges(&mmap, config.worker_count());
    debug!(ranges = ranges.len(), bytes = mmap.len(), "mapped input");

    let total = ranges
        .into_par_iter()
        .map(|(start, end)| {
            let mut local = Summary::default();
            local.absorb_chunk(&mmap[start..end]);
            local
        })
        .reduce(Summary::default, |mut acc, partial| {
            acc.merge(partial);
            acc
        });

    info!(
        stations = total.stations.len(),
        records = total.records(),
        rejected = total.rejected,
        "mapped pass finished"
    );
    Ok(total)
}

/// Cuts `data` into at most `parts` ranges, each ending just after a `\n`
/// (or at the end of the data).
pub fn split_ranges(data: &[u8], parts: usize) -> Vec<(usize, usize)> {
    let len = data.len();
    let parts = parts.max(1);
    let step = (len / parts).max(1);
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    while start < len {
        let target = start + step;
        let end = if ranges.len() + 1 == parts || target >= len {
            len
        } else {
            match memchr::memchr(b'\n', &data[target..]) {
                Some(pos) => target + pos + 1,
                None => len,
            }
        };
        ranges.push((start, end));
        start = end;
    }
    ranges
}
