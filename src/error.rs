use std::io;
use std::path::PathBuf;

use crate::record::RecordError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// An unterminated line grew past the configured limit.
    #[error("line exceeds {limit} bytes without a line break")]
    LineTooLong { limit: usize },

    /// Only raised by the strict sequential mode.
    #[error("line {line}: {source}")]
    Record { line: u64, source: RecordError },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("a pipeline thread panicked")]
    WorkerPanicked,
}
