//! Load-then-clean pipeline shared by the `map` and `stops` commands.

use anyhow::Result;
use std::path::Path;

use crate::clean::{CleanStats, clean_stops};
use crate::gtfs::Stop;
use crate::loader::load_all;
use crate::stats::FeedLoadStats;

#[derive(Debug)]
pub struct StopSet {
    pub stops: Vec<Stop>,
    pub feeds: Vec<FeedLoadStats>,
    pub clean: CleanStats,
}

/// Reads every `gtfs_*.zip` in `folder` and returns the cleaned, de-duplicated
/// stops along with per-feed run statistics.
pub fn build_stop_set(folder: &Path, only_feeds: &[String]) -> Result<StopSet> {
    let loaded = load_all(folder)?;
    let (stops, clean) = clean_stops(&loaded.raw, only_feeds);

    let feeds = loaded
        .feeds
        .into_iter()
        .map(|f| f.with_clean(&clean))
        .collect();

    Ok(StopSet {
        stops,
        feeds,
        clean,
    })
}
