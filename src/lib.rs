//! Per-key min/mean/max over large `KEY;VALUE` files.
//!
//! The input is split into newline-aligned chunks that a pool of workers
//! aggregates independently; the partial results are merged into one map
//! and rendered as a sorted report.

pub mod chunk;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod stats;

pub use chunk::ChunkSplitter;
pub use error::{Error, Result};
pub use pipeline::{aggregate_file, aggregate_reader, aggregate_strict, Config, Mode};
pub use record::{parse_record, RecordError};
pub use report::{render, Format};
pub use stats::{merge_maps, Stats, StatsMap, Summary};
