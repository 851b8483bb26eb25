//! Data types used by the violation analysis.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const OCCURRENCE_FORMATS: &[&str] = &["%m/%d/%Y %I:%M:%S %p", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single row of the ACE violations CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Violation {
    #[serde(rename = "Violation ID", default)]
    pub violation_id: Option<String>,
    #[serde(rename = "Vehicle ID", default)]
    pub vehicle_id: Option<String>,
    #[serde(rename = "First Occurrence", default)]
    pub first_occurrence: Option<String>,
    #[serde(rename = "Violation Status", default)]
    pub violation_status: Option<String>,
    #[serde(rename = "Violation Type", default)]
    pub violation_type: Option<String>,
    #[serde(rename = "Bus Route ID", default)]
    pub bus_route_id: Option<String>,
    #[serde(
        rename = "Violation Latitude",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub latitude: Option<f64>,
    #[serde(
        rename = "Violation Longitude",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub longitude: Option<f64>,
    #[serde(rename = "Stop ID", default)]
    pub stop_id: Option<String>,
    #[serde(rename = "Stop Name", default)]
    pub stop_name: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Violation {
    pub fn route(&self) -> Option<&str> {
        non_blank(&self.bus_route_id)
    }

    pub fn vehicle(&self) -> Option<&str> {
        non_blank(&self.vehicle_id)
    }

    pub fn stop(&self) -> Option<&str> {
        non_blank(&self.stop_id)
    }

    /// Parses `First Occurrence` in the export's US format, falling back to ISO-8601.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let raw = non_blank(&self.first_occurrence)?;
        OCCURRENCE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Knobs for [`crate::ace::aggregate::summarize`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub repeat_threshold: usize,
    pub top_n: usize,
    pub cutover: NaiveDate,
    pub cbd_routes: Vec<String>,
}

/// Congestion pricing in the Manhattan CBD began on 2025-01-05.
pub fn default_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 5).unwrap_or_default()
}

/// ACE routes that run through the CBD (Manhattan south of 60th St).
pub fn default_cbd_routes() -> Vec<String> {
    [
        "M2", "M4", "M5", "M14A+", "M14D+", "M15+", "M23+", "M34+", "M34A+", "M42", "M101",
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            repeat_threshold: 2,
            top_n: 25,
            cutover: default_cutover(),
            cbd_routes: default_cbd_routes(),
        }
    }
}

/// Violation volume for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCount {
    pub route_id: String,
    pub violations: usize,
    pub distinct_vehicles: usize,
}

/// A vehicle cited at least `repeat_threshold` times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatOffender {
    pub vehicle_id: String,
    pub violations: usize,
    pub routes: Vec<String>,
}

/// Distribution of violations across vehicles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffenderStats {
    pub vehicles: usize,
    pub repeat_vehicles: usize,
    pub mean_per_vehicle: f64,
    pub stddev_per_vehicle: f64,
}

/// Before/after counts for one route around the cutover date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteShift {
    pub route_id: String,
    pub cbd: bool,
    pub before: usize,
    pub after: usize,
    pub before_per_day: f64,
    pub after_per_day: f64,
    pub change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CbdComparison {
    pub cutover: NaiveDate,
    pub days_before: i64,
    pub days_after: i64,
    pub undated: usize,
    pub cbd_before: usize,
    pub cbd_after: usize,
    pub non_cbd_before: usize,
    pub non_cbd_after: usize,
    pub routes: Vec<RouteShift>,
}

/// Violations grouped at one bus stop, placed at their mean coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopHotspot {
    pub stop_id: String,
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub violations: usize,
}

/// Complete analysis result, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ViolationSummary {
    pub generated_at: DateTime<Utc>,
    pub total_violations: usize,
    pub skipped_rows: usize,
    pub routes: Vec<RouteCount>,
    pub offenders: OffenderStats,
    pub repeat_offenders: Vec<RepeatOffender>,
    pub cbd: CbdComparison,
    pub hotspots: Vec<StopHotspot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(raw: &str) -> Violation {
        Violation {
            first_occurrence: Some(raw.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_occurred_at_us_format() {
        let ts = at("01/06/2025 03:15:00 PM").occurred_at().unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(ts.hour(), 15);
    }

    #[test]
    fn test_occurred_at_iso_format() {
        let ts = at("2024-12-31T23:59:00.000").occurred_at().unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_occurred_at_garbage() {
        assert!(at("yesterday").occurred_at().is_none());
        assert!(at("  ").occurred_at().is_none());
        assert!(Violation::default().occurred_at().is_none());
    }

    #[test]
    fn test_blank_ids_are_none() {
        let v = Violation {
            bus_route_id: Some("  ".to_string()),
            vehicle_id: Some(" abc ".to_string()),
            ..Default::default()
        };
        assert!(v.route().is_none());
        assert_eq!(v.vehicle(), Some("abc"));
    }
}
