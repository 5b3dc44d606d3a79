use std::borrow::Cow;

use crate::stats::{Stats, StatsMap};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// `{A=min/mean/max, B=min/mean/max}`
    #[default]
    Braces,
    /// One `station;min;mean;max` line per station, no trailing newline.
    Lines,
}

/// Entries in ascending byte order of their keys.
pub fn sorted(stations: &StatsMap) -> Vec<(&[u8], &Stats)> {
    let mut entries: Vec<(&[u8], &Stats)> = stations
        .iter()
        .map(|(station, stats)| (&station[..], stats))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Keys that are not UTF-8 are shown with replacement characters.
pub fn display_key(key: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(key)
}

pub fn render(stations: &StatsMap, format: Format) -> String {
    let entries = sorted(stations);
    match format {
        Format::Braces => {
            let body: Vec<String> = entries
                .into_iter()
                .map(|(station, stats)| {
                    format!(
                        "{}={:.1}/{:.1}/{:.1}",
                        display_key(station),
                        stats.min,
                        stats.mean(),
                        stats.max
                    )
                })
                .collect();
            format!("{{{}}}", body.join(", "))
        }
        Format::Lines => entries
            .into_iter()
            .map(|(station, stats)| {
                format!(
                    "{};{:.1};{:.1};{:.1}",
                    display_key(station),
                    stats.min,
                    stats.mean(),
                    stats.max
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
