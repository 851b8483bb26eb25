//! Leaflet HTML generation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::ace::types::StopHotspot;
use crate::error::MapError;
use crate::gtfs::Stop;
use crate::map::bounds::Bounds;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CARTODB_POSITRON: &str =
    "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const CARTODB_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

/// Presentation settings for [`render_map`].
#[derive(Debug, Clone, Serialize)]
pub struct MapOptions {
    pub title: String,
    pub radius: f64,
    pub fill_opacity: f64,
    pub opacity: f64,
    pub zoom_start: u8,
    pub prefer_canvas: bool,
    pub pane_z_index: u32,
    pub collapsed_layers: bool,
    pub tiles_url: String,
    pub tiles_attribution: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: "MTA bus stops".to_string(),
            radius: 1.8,
            fill_opacity: 0.8,
            opacity: 0.8,
            zoom_start: 11,
            prefer_canvas: true,
            pane_z_index: 650,
            collapsed_layers: false,
            tiles_url: CARTODB_POSITRON.to_string(),
            tiles_attribution: CARTODB_ATTRIBUTION.to_string(),
        }
    }
}

/// Compact per-marker payload: `[lat, lon, tooltip]`.
#[derive(Serialize)]
struct Marker<'a>(f64, f64, &'a str);

#[derive(Serialize)]
struct HotspotMarker(f64, f64, String, usize);

#[derive(Serialize)]
struct MapData<'a> {
    options: &'a MapOptions,
    bounds: [[f64; 2]; 2],
    center: [f64; 2],
    stops: Vec<Marker<'a>>,
    hotspots: Vec<HotspotMarker>,
    max_violations: usize,
}

fn tooltip(stop: &Stop) -> String {
    format!("{} (ID: {})", stop.stop_name, stop.stop_id)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders every stop (and optional violation hotspots) into one HTML page.
///
/// The view is fit to the stop bounds, so an empty stop set is an error.
#[tracing::instrument(skip_all, fields(stops = stops.len(), hotspots = hotspots.len()))]
pub fn render_map(stops: &[Stop], hotspots: &[StopHotspot], options: &MapOptions) -> Result<String> {
    let bounds = Bounds::from_stops(stops).ok_or(MapError::EmptyMap)?;

    let tooltips: Vec<String> = stops.iter().map(tooltip).collect();
    let data = MapData {
        options,
        bounds: bounds.leaflet_corners(),
        center: bounds.center(),
        stops: stops
            .iter()
            .zip(&tooltips)
            .map(|(s, t)| Marker(s.lat, s.lon, t))
            .collect(),
        hotspots: hotspots
            .iter()
            .map(|h| {
                HotspotMarker(
                    h.lat,
                    h.lon,
                    format!("{} (ID: {}): {} violations", h.stop_name, h.stop_id, h.violations),
                    h.violations,
                )
            })
            .collect(),
        max_violations: hotspots.iter().map(|h| h.violations).max().unwrap_or(0),
    };

    // no raw '<' may reach the script element ("</script>", "<!--")
    let json = serde_json::to_string(&data)?.replace('<', "\\u003c");
    debug!(bytes = json.len(), "Serialized map data");

    Ok(PAGE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&options.title))
        .replace("{{LEAFLET_CSS}}", LEAFLET_CSS)
        .replace("{{LEAFLET_JS}}", LEAFLET_JS)
        .replace("{{DATA}}", &json))
}

/// Writes the page to `path` and returns its absolute location.
pub fn write_map(path: &Path, html: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;

    let out = std::fs::canonicalize(path)?;
    info!(path = %out.display(), "Wrote map");
    Ok(out)
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{{TITLE}}</title>
<link rel="stylesheet" href="{{LEAFLET_CSS}}" />
<script src="{{LEAFLET_JS}}"></script>
<style>html, body, #map { width: 100%; height: 100%; margin: 0; padding: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const DATA = {{DATA}};
const opts = DATA.options;

function esc(s) {
  return String(s).replace(/[&<>"']/g, c => ({"&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;"}[c]));
}

const map = L.map("map", { preferCanvas: opts.prefer_canvas, center: DATA.center, zoom: opts.zoom_start });
L.tileLayer(opts.tiles_url, { attribution: opts.tiles_attribution, subdomains: "abcd", maxZoom: 20 }).addTo(map);
map.fitBounds(DATA.bounds);

map.createPane("stops");
map.getPane("stops").style.zIndex = opts.pane_z_index;

const overlays = {};

const stops = L.featureGroup();
for (const [lat, lon, tip] of DATA.stops) {
  L.circleMarker([lat, lon], {
    pane: "stops",
    radius: opts.radius,
    fill: true,
    fillOpacity: opts.fill_opacity,
    opacity: opts.opacity,
  }).bindTooltip(esc(tip)).addTo(stops);
}
stops.addTo(map);
overlays["Stops (dots)"] = stops;

if (DATA.hotspots.length > 0) {
  const hot = L.featureGroup();
  for (const [lat, lon, tip, count] of DATA.hotspots) {
    L.circleMarker([lat, lon], {
      radius: 3 + 12 * Math.sqrt(count / Math.max(DATA.max_violations, 1)),
      color: "#c0392b",
      fill: true,
      fillOpacity: 0.5,
      weight: 1,
    }).bindTooltip(esc(tip)).addTo(hot);
  }
  hot.addTo(map);
  overlays["ACE violations"] = hot;
}

L.control.layers(null, overlays, { collapsed: opts.collapsed_layers }).addTo(map);
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            stop_id: id.to_string(),
            stop_name: name.to_string(),
            lat,
            lon,
            borough_feed: "gtfs_m".to_string(),
        }
    }

    #[test]
    fn test_render_empty_is_error() {
        let err = render_map(&[], &[], &MapOptions::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<MapError>(), Some(MapError::EmptyMap)));
    }

    #[test]
    fn test_render_contains_stops_and_layers() {
        let stops = vec![
            stop("400001", "BROADWAY/W 207 ST", 40.867924, -73.920571),
            stop("400002", "NAGLE AV/DYCKMAN ST", 40.8612, -73.9260),
        ];
        let html = render_map(&stops, &[], &MapOptions::default()).unwrap();

        assert!(html.contains("BROADWAY/W 207 ST (ID: 400001)"));
        assert!(html.contains("\"radius\":1.8"));
        assert!(html.contains("\"pane_z_index\":650"));
        assert!(html.contains("\"prefer_canvas\":true"));
        assert!(html.contains("Stops (dots)"));
        assert!(html.contains("light_all"));
        assert!(html.contains("\"bounds\":[[40.8612,-73.926],[40.867924,-73.920571]]"));
    }

    #[test]
    fn test_render_escapes_script_breakout() {
        let stops = vec![stop("1", "</script><b>", 40.7, -74.0)];
        let mut options = MapOptions::default();
        options.title = "<Stops & more>".to_string();

        let html = render_map(&stops, &[], &options).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("<title>&lt;Stops &amp; more&gt;</title>"));
    }

    #[test]
    fn test_render_escapes_comment_opener() {
        let stops = vec![stop("1", "<!--<script>", 40.7, -74.0)];
        let html = render_map(&stops, &[], &MapOptions::default()).unwrap();

        assert!(!html.contains("<!--"));
        assert!(html.contains("\\u003c!--\\u003cscript> (ID: 1)"));
        assert!(html.trim_end().ends_with("</script>\n</body>\n</html>"));
    }

    #[test]
    fn test_render_hotspot_layer_data() {
        let stops = vec![stop("1", "A", 40.7, -74.0)];
        let hotspots = vec![StopHotspot {
            stop_id: "401".to_string(),
            stop_name: "1 AV/E 14 ST".to_string(),
            lat: 40.73,
            lon: -73.98,
            violations: 12,
        }];
        let html = render_map(&stops, &hotspots, &MapOptions::default()).unwrap();
        assert!(html.contains("1 AV/E 14 ST (ID: 401): 12 violations"));
        assert!(html.contains("\"max_violations\":12"));
    }

    #[test]
    fn test_write_map_returns_absolute_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("map.html");
        let out = write_map(&path, "<html></html>").unwrap();
        assert!(out.is_absolute());
        assert_eq!(std::fs::read_to_string(out).unwrap(), "<html></html>");
    }
}
