#![allow(dead_code)]

use std::io::{self, Read, Write};

use brc_aggregate::report::display_key;
use brc_aggregate::{Stats, StatsMap};
use proptest::prelude::*;
use proptest::sample::Index;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

const STATIONS: &[&str] = &[
    "Abha", "Abidjan", "Accra", "Addis Ababa", "Bergen", "Bulawayo", "Cairo", "Dakar",
    "Hamburg", "Istanbul", "Oslo", "Paris", "Roseau", "São Paulo", "Zürich",
];

/// Seeded `station;value\n` lines with one decimal digit.
pub fn measurements(lines: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::with_capacity(lines * 16);
    for _ in 0..lines {
        let station = STATIONS[rng.gen_range(0..STATIONS.len())];
        let tenths: i32 = rng.gen_range(-999..=999);
        out.push_str(&format!("{};{:.1}\n", station, tenths as f64 / 10.0));
    }
    out
}

/// Any non-empty byte string usable as a key: no `;` and no line break.
pub fn key() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        any::<u8>().prop_filter("delimiter or line break", |b| *b != b';' && *b != b'\n'),
        1..8,
    )
}

/// A pool of keys and rows drawing from it, rendered as `KEY;VALUE` lines.
/// The final line break is dropped when `open_tail` is set.
pub fn records() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec(key(), 1..10),
        prop::collection::vec((any::<Index>(), -100.0f64..100.0), 0..300),
        any::<bool>(),
    )
        .prop_map(|(pool, rows, open_tail)| {
            let mut out = Vec::new();
            for (pick, value) in rows {
                out.extend_from_slice(&pool[pick.index(pool.len())]);
                out.extend_from_slice(format!(";{value}\n").as_bytes());
            }
            if open_tail {
                out.pop();
            }
            out
        })
}

pub fn temp_input(content: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

/// Exact count/min/max, tolerance on the sum.
pub fn assert_same_stats(left: &StatsMap, right: &StatsMap) {
    assert_eq!(left.len(), right.len(), "station count differs");
    for (station, l) in left {
        let name = display_key(station);
        let r: &Stats = right
            .get(station)
            .unwrap_or_else(|| panic!("{name:?} missing on the right"));
        assert_eq!(l.count, r.count, "{name:?} count");
        assert_eq!(l.min, r.min, "{name:?} min");
        assert_eq!(l.max, r.max, "{name:?} max");
        assert!(close(l.sum, r.sum), "{name:?} sum {} vs {}", l.sum, r.sum);
    }
}

/// Hands out at most `step` bytes per `read` call.
pub struct Trickle<'a> {
    pub data: &'a [u8],
    pub step: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Serves `data`, then fails every following read.
pub struct FailingReader<'a> {
    pub data: &'a [u8],
}

impl Read for FailingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}
