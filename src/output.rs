//! Output formatting and persistence.
//!
//! Supports pretty-printing, JSON files, run-log CSV append and the cleaned
//! stop export (plain or gzip).

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::gtfs::Stop;
use crate::stats::FeedLoadStats;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`FeedLoadStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, feed_stats: &FeedLoadStats) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on the first write
        .from_writer(file);

    writer.serialize(feed_stats)?;
    writer.flush()?;

    Ok(())
}

const STOP_COLUMNS: [&str; 5] = ["stop_id", "stop_name", "stop_lat", "stop_lon", "borough_feed"];

fn write_stops<W: Write>(out: W, stops: &[Stop]) -> Result<W> {
    // header written up front so an empty export is still a valid CSV
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(STOP_COLUMNS)?;
    for stop in stops {
        writer.serialize(stop)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing stop CSV: {}", e.error()))
}

/// Writes cleaned stops as `stop_id,stop_name,stop_lat,stop_lon,borough_feed`,
/// gzip-compressed when `gzip` is set.
#[tracing::instrument(skip(stops), fields(path = %path.display(), stops = stops.len()))]
pub fn write_stops_csv(path: &Path, stops: &[Stop], gzip: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    if gzip {
        let encoder = write_stops(GzEncoder::new(file, Compression::default()), stops)?;
        encoder.finish()?;
    } else {
        write_stops(file, stops)?;
    }

    info!("Wrote stop export");
    Ok(())
}

/// Serializes `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Wrote JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn stops() -> Vec<Stop> {
        vec![Stop {
            stop_id: "400001".to_string(),
            stop_name: "BROADWAY/W 207 ST".to_string(),
            lat: 40.867924,
            lon: -73.920571,
            borough_feed: "gtfs_m".to_string(),
        }]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&FeedLoadStats::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&FeedLoadStats::default()).unwrap();
    }

    #[test]
    fn test_append_record_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("load.csv");

        append_record(&path, &FeedLoadStats::default()).unwrap();

        assert!(path.exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("load.csv");

        let stats = FeedLoadStats::new("gtfs_bx", 10, true);
        append_record(&path, &stats).unwrap();
        append_record(&path, &stats).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);
        let header = content.lines().next().unwrap();
        assert!(header.starts_with("timestamp,borough_feed,rows_read,has_stops_txt,"));
    }

    #[test]
    fn test_write_stops_csv_plain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stops.csv");
        write_stops_csv(&path, &stops(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("stop_id,stop_name,stop_lat,stop_lon,borough_feed")
        );
        assert_eq!(
            lines.next(),
            Some("400001,BROADWAY/W 207 ST,40.867924,-73.920571,gtfs_m")
        );
    }

    #[test]
    fn test_write_stops_csv_empty_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        write_stops_csv(&path, &[], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "stop_id,stop_name,stop_lat,stop_lon,borough_feed\n");
    }

    #[test]
    fn test_write_stops_csv_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stops.csv.gz");
        write_stops_csv(&path, &stops(), true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with("stop_id,stop_name"));
        assert!(decoded.contains("gtfs_m"));
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        write_json(&path, &FeedLoadStats::new("gtfs_q", 3, true)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["borough_feed"], "gtfs_q");
        assert_eq!(value["rows_read"], 3);
    }
}
