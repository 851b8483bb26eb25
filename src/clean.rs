//! Coordinate validation, de-duplication and feed filtering for raw stops.

use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::gtfs::{RawStop, Stop};

/// Per-feed cleaning counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedCleanCounts {
    pub dropped_missing_coords: usize,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub kept: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CleanStats {
    pub dropped_missing_coords: usize,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub kept: usize,
    pub per_feed: BTreeMap<String, FeedCleanCounts>,
}

/// Drops rows without usable coordinates, rows outside `feeds` (when
/// non-empty), then duplicate `(stop_id, lat, lon)` rows, keeping the first
/// occurrence.
pub fn clean_stops(raw: &[RawStop], feeds: &[String]) -> (Vec<Stop>, CleanStats) {
    let mut stats = CleanStats::default();
    let mut seen: HashSet<(String, u64, u64)> = HashSet::new();
    let mut stops = Vec::with_capacity(raw.len());

    for row in raw {
        let counts = stats.per_feed.entry(row.borough_feed.clone()).or_default();

        let Some(stop) = row.to_stop() else {
            counts.dropped_missing_coords += 1;
            stats.dropped_missing_coords += 1;
            continue;
        };

        if !feeds.is_empty() && !feeds.contains(&stop.borough_feed) {
            counts.filtered_out += 1;
            stats.filtered_out += 1;
            continue;
        }

        let key = (stop.stop_id.clone(), coord_key(stop.lat), coord_key(stop.lon));
        if !seen.insert(key) {
            counts.duplicates_removed += 1;
            stats.duplicates_removed += 1;
            continue;
        }

        counts.kept += 1;
        stats.kept += 1;
        stops.push(stop);
    }

    info!(
        kept = stats.kept,
        dropped_missing_coords = stats.dropped_missing_coords,
        duplicates_removed = stats.duplicates_removed,
        filtered_out = stats.filtered_out,
        "Cleaned stops"
    );

    (stops, stats)
}

/// Exact float equality on the parsed value, with `-0.0` folded into `0.0`.
fn coord_key(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}
