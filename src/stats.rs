use std::collections::HashMap;

use tracing::warn;

use crate::record::parse_record;

/// Running count, minimum, maximum and sum for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl Stats {
    pub fn new(value: f64) -> Self {
        Stats {
            min: value,
            max: value,
            sum: value,
            count: 1,
        }
    }

    pub fn absorb(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &Stats) {
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Keys are the raw key bytes of the input; two keys are equal only if
/// their bytes are.
pub type StatsMap = HashMap<Box<[u8]>, Stats, ahash::RandomState>;

pub fn record_value(map: &mut StatsMap, key: &[u8], value: f64) {
    // Lookup by slice first so a repeated key never allocates.
    match map.get_mut(key) {
        Some(stats) => stats.absorb(value),
        None => {
            map.insert(Box::from(key), Stats::new(value));
        }
    }
}

/// Folds `local` into `global`. Keys missing from `global` are moved over as-is.
pub fn merge_maps(global: &mut StatsMap, local: StatsMap) {
    for (station, stats) in local {
        global
            .entry(station)
            .and_modify(|gstats| gstats.merge(&stats))
            .or_insert(stats);
    }
}

/// A key-to-stats map together with the number of lines rejected while
/// building it.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub stations: StatsMap,
    pub rejected: u64,
}

impl Summary {
    /// Parses every line of a newline-aligned chunk, skipping and logging the
    /// ones that do not parse.
    pub fn absorb_chunk(&mut self, chunk: &[u8]) {
        for line in chunk.split(|&b| b == b'\n') {
            if line.is_empty() || line == b"\r" {
                continue;
            }
            match parse_record(line) {
                Ok((station, value)) => record_value(&mut self.stations, station, value),
                Err(err) => {
                    warn!(line = %String::from_utf8_lossy(line), error = %err, "skipping line");
                    self.rejected += 1;
                }
            }
        }
    }

    pub fn merge(&mut self, other: Summary) {
        merge_maps(&mut self.stations, other.stations);
        self.rejected += other.rejected;
    }

    pub fn station(&self, key: impl AsRef<[u8]>) -> Option<&Stats> {
        self.stations.get(key.as_ref())
    }

    pub fn records(&self) -> u64 {
        self.stations.values().map(|s| s.count).sum()
    }
}
