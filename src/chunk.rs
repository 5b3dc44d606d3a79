//! Repartitioning of raw reads into chunks that end on a line break.

use std::io::{ErrorKind, Read};
use std::mem;

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Reads `reader` in blocks of `chunk_size` bytes and yields chunks holding
/// only complete lines.
///
/// Each chunk is the carried-over leftover plus the fresh block up to and
/// including its last `\n`. A block with no `\n` is appended to the leftover
/// and reading continues; once the leftover is longer than `max_line_bytes`
/// the iterator yields [`Error::LineTooLong`] and stops. Bytes after the last
/// line break of the input are yielded as a final chunk.
pub struct ChunkSplitter<R> {
    reader: R,
    block: Vec<u8>,
    leftover: Vec<u8>,
    max_line_bytes: usize,
    done: bool,
}

impl<R: Read> ChunkSplitter<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        ChunkSplitter {
            reader,
            block: vec![0; chunk_size.max(1)],
            leftover: Vec::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            done: false,
        }
    }

    pub fn max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit;
        self
    }

    fn fail(&mut self, err: Error) -> Option<Result<Vec<u8>>> {
        self.done = true;
        self.leftover = Vec::new();
        Some(Err(err))
    }
}

impl<R: Read> Iterator for ChunkSplitter<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let read = match self.reader.read(&mut self.block) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return self.fail(Error::Io(e)),
            };

            if read == 0 {
                self.done = true;
                if self.leftover.is_empty() {
                    return None;
                }
                return Some(Ok(mem::take(&mut self.leftover)));
            }

            let fresh = &self.block[..read];
            // Only the fresh bytes are searched; the leftover has no break.
            let chunk = match memchr::memrchr(b'\n', fresh) {
                Some(last) => {
                    let mut chunk = mem::take(&mut self.leftover);
                    chunk.extend_from_slice(&fresh[..=last]);
                    self.leftover.extend_from_slice(&fresh[last + 1..]);
                    Some(chunk)
                }
                None => {
                    self.leftover.extend_from_slice(fresh);
                    None
                }
            };

            if self.leftover.len() > self.max_line_bytes {
                let limit = self.max_line_bytes;
                return self.fail(Error::LineTooLong { limit });
            }
            if let Some(chunk) = chunk {
                return Some(Ok(chunk));
            }
        }
    }
}
