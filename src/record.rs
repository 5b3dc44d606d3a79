//! Parsing of a single `KEY;VALUE` line.

pub const DELIMITER: u8 = b';';

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(Malformed),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("expected 2 fields, found {0}")]
    FieldCount(usize),

    #[error("empty key")]
    EmptyKey,
}

/// Splits `line` (without its `\n`) into a key and a finite value.
///
/// The key is kept as raw bytes, whatever its encoding. A trailing `\r` is
/// ignored so CRLF files parse the same as LF files. Values are decimal
/// literals with an optional exponent; hexadecimal floats such as `0x1p-2`
/// are not accepted and fail with [`RecordError::InvalidNumber`].
pub fn parse_record(line: &[u8]) -> Result<(&[u8], f64), RecordError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let sep = match memchr::memchr(DELIMITER, line) {
        Some(sep) => sep,
        None => return Err(RecordError::Malformed(Malformed::FieldCount(1))),
    };
    let (key, value) = (&line[..sep], &line[sep + 1..]);

    let extra = memchr::memchr_iter(DELIMITER, value).count();
    if extra != 0 {
        return Err(RecordError::Malformed(Malformed::FieldCount(extra + 2)));
    }
    if key.is_empty() {
        return Err(RecordError::Malformed(Malformed::EmptyKey));
    }

    match lexical_core::parse::<f64>(value) {
        Ok(v) if v.is_finite() => Ok((key, v)),
        _ => Err(RecordError::InvalidNumber(
            String::from_utf8_lossy(value).into_owned(),
        )),
    }
}
