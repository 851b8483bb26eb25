//! GTFS static `stops.txt` records.

use anyhow::Result;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One row of `stops.txt`, every column kept as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStop {
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub stop_lat: Option<String>,
    #[serde(default)]
    pub stop_lon: Option<String>,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub stop_desc: Option<String>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub parent_station: Option<String>,
    #[serde(default)]
    pub wheelchair_boarding: Option<String>,

    /// Stem of the zip this row came from, e.g. `gtfs_m`.
    #[serde(skip)]
    pub borough_feed: String,
}

/// A stop with usable WGS84 coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    #[serde(rename = "stop_lat")]
    pub lat: f64,
    #[serde(rename = "stop_lon")]
    pub lon: f64,
    pub borough_feed: String,
}

impl RawStop {
    /// Returns `None` when either coordinate is missing or not a finite number.
    pub fn to_stop(&self) -> Option<Stop> {
        let lat = parse_coord(self.stop_lat.as_deref())?;
        let lon = parse_coord(self.stop_lon.as_deref())?;

        Some(Stop {
            stop_id: self.stop_id.clone().unwrap_or_default(),
            stop_name: self.stop_name.clone().unwrap_or_default(),
            lat,
            lon,
            borough_feed: self.borough_feed.clone(),
        })
    }
}

fn parse_coord(value: Option<&str>) -> Option<f64> {
    let v: f64 = value?.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Reads a `stops.txt` CSV, tagging every row with `borough_feed`.
pub fn parse_stops<R: Read>(reader: R, borough_feed: &str) -> Result<Vec<RawStop>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let mut row: RawStop = result?;
        row.borough_feed = borough_feed.to_string();
        rows.push(row);
    }

    Ok(rows)
}
