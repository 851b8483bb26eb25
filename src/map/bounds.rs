use serde::Serialize;

use crate::gtfs::Stop;

/// Bounding box of a stop set, in `(minx, miny, maxx, maxy)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Returns `None` for an empty slice.
    pub fn from_stops(stops: &[Stop]) -> Option<Self> {
        let first = stops.first()?;
        let init = Bounds {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };

        Some(stops.iter().skip(1).fold(init, |b, s| Bounds {
            min_lon: b.min_lon.min(s.lon),
            min_lat: b.min_lat.min(s.lat),
            max_lon: b.max_lon.max(s.lon),
            max_lat: b.max_lat.max(s.lat),
        }))
    }

    /// Leaflet `fitBounds` corners: `[[south, west], [north, east]]`.
    pub fn leaflet_corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lon], [self.max_lat, self.max_lon]]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(lat: f64, lon: f64) -> Stop {
        Stop {
            stop_id: "s".to_string(),
            stop_name: String::new(),
            lat,
            lon,
            borough_feed: "gtfs_m".to_string(),
        }
    }

    #[test]
    fn test_empty_has_no_bounds() {
        assert!(Bounds::from_stops(&[]).is_none());
    }

    #[test]
    fn test_single_stop_is_a_point() {
        let b = Bounds::from_stops(&[stop(40.7, -74.0)]).unwrap();
        assert_eq!(b.min_lat, b.max_lat);
        assert_eq!(b.min_lon, b.max_lon);
    }

    #[test]
    fn test_bounds_and_leaflet_order() {
        let stops = vec![stop(40.5, -74.2), stop(40.9, -73.7), stop(40.7, -73.9)];
        let b = Bounds::from_stops(&stops).unwrap();

        assert_eq!(
            b,
            Bounds {
                min_lon: -74.2,
                min_lat: 40.5,
                max_lon: -73.7,
                max_lat: 40.9,
            }
        );
        assert_eq!(b.leaflet_corners(), [[40.5, -74.2], [40.9, -73.7]]);
        let [lat, lon] = b.center();
        assert!((lat - 40.7).abs() < 1e-9);
        assert!((lon + 73.95).abs() < 1e-9);
    }
}
