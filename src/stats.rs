use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clean::CleanStats;

/// One run-log row per GTFS zip.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FeedLoadStats {
    pub timestamp: DateTime<Utc>,
    pub borough_feed: String,
    pub rows_read: usize,
    pub has_stops_txt: bool,

    // cleaning
    pub dropped_missing_coords: usize,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub stops_kept: usize,
}

impl FeedLoadStats {
    pub fn new(borough_feed: &str, rows_read: usize, has_stops_txt: bool) -> Self {
        FeedLoadStats {
            timestamp: Utc::now(),
            borough_feed: borough_feed.to_string(),
            has_stops_txt,
            rows_read,
            ..Default::default()
        }
    }

    /// Copies this feed's cleaning counters out of `clean`.
    pub fn with_clean(mut self, clean: &CleanStats) -> Self {
        if let Some(c) = clean.per_feed.get(&self.borough_feed) {
            self.dropped_missing_coords = c.dropped_missing_coords;
            self.duplicates_removed = c.duplicates_removed;
            self.filtered_out = c.filtered_out;
            self.stops_kept = c.kept;
        }
        self
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn kept_pct(&self) -> f64 {
        Self::pct(self.stops_kept, self.rows_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::FeedCleanCounts;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(FeedLoadStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(FeedLoadStats::pct(50, 100), 50.0);
        assert_eq!(FeedLoadStats::pct(1, 4), 25.0);
    }

    #[test]
    fn test_with_clean_copies_matching_feed() {
        let mut clean = CleanStats::default();
        clean.per_feed.insert(
            "gtfs_m".to_string(),
            FeedCleanCounts {
                dropped_missing_coords: 1,
                duplicates_removed: 2,
                filtered_out: 0,
                kept: 7,
            },
        );

        let stats = FeedLoadStats::new("gtfs_m", 10, true).with_clean(&clean);
        assert_eq!(stats.dropped_missing_coords, 1);
        assert_eq!(stats.duplicates_removed, 2);
        assert_eq!(stats.stops_kept, 7);
        assert_eq!(stats.kept_pct(), 70.0);

        let other = FeedLoadStats::new("gtfs_q", 3, true).with_clean(&clean);
        assert_eq!(other.stops_kept, 0);
    }
}
