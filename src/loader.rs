//! Discovers the borough GTFS zips in a folder and reads their `stops.txt`.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::MapError;
use crate::gtfs::{RawStop, parse_stops};
use crate::stats::FeedLoadStats;

const STOPS_ENTRY: &str = "stops.txt";

/// Raw rows from every feed plus one stats row per zip.
#[derive(Debug, Default)]
pub struct LoadedStops {
    pub raw: Vec<RawStop>,
    pub feeds: Vec<FeedLoadStats>,
}

/// Lists `gtfs_*.zip` files directly inside `folder`, sorted by path.
pub fn discover_zips(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(MapError::FolderMissing(folder.to_path_buf()).into());
    }

    let mut zips = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("gtfs_") && name.ends_with(".zip") {
            zips.push(path);
        }
    }
    zips.sort();

    if zips.is_empty() {
        return Err(MapError::NoZips(folder.to_path_buf()).into());
    }

    info!(
        zips = ?zips.iter().filter_map(|p| p.file_name()).collect::<Vec<_>>(),
        "Found GTFS zips"
    );
    Ok(zips)
}

/// The zip's file stem, used to tag every stop it contributes.
pub fn feed_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Reads `stops.txt` out of a GTFS zip. Returns `Ok(None)` when the entry is absent.
#[tracing::instrument(fields(zip = %path.display()))]
pub fn read_stops_from_zip(path: &Path) -> Result<Option<Vec<RawStop>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("reading zip {}", path.display()))?;

    let entry = match archive.by_name(STOPS_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            warn!(zip = %path.display(), "stops.txt missing from zip");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let rows = parse_stops(entry, &feed_name(path))?;
    debug!(rows = rows.len(), "Parsed stops.txt");
    Ok(Some(rows))
}

/// Reads and concatenates stops from every zip in `folder`, in zip order.
#[tracing::instrument]
pub fn load_all(folder: &Path) -> Result<LoadedStops> {
    let zips = discover_zips(folder)?;
    let mut loaded = LoadedStops::default();
    let mut any_stops = false;

    for zip_path in &zips {
        let feed = feed_name(zip_path);
        match read_stops_from_zip(zip_path)? {
            Some(rows) => {
                any_stops = true;
                loaded.feeds.push(FeedLoadStats::new(&feed, rows.len(), true));
                loaded.raw.extend(rows);
            }
            None => loaded.feeds.push(FeedLoadStats::new(&feed, 0, false)),
        }
    }

    if !any_stops {
        return Err(MapError::NoStops.into());
    }

    info!(rows = loaded.raw.len(), feeds = loaded.feeds.len(), "Loaded raw stops");
    Ok(loaded)
}
