/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Count per day over a window of at least one day.
pub fn per_day(count: usize, days: i64) -> f64 {
    count as f64 / days.max(1) as f64
}

/// Percent change from `before` to `after`; `None` when there is no baseline.
pub fn change_pct(before: f64, after: f64) -> Option<f64> {
    (before > 0.0).then(|| (after - before) / before * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(stddev(&values, m), 2.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[], 0.0), 0.0);
    }

    #[test]
    fn test_per_day_floor_of_one_day() {
        assert_eq!(per_day(10, 0), 10.0);
        assert_eq!(per_day(10, 4), 2.5);
    }

    #[test]
    fn test_change_pct() {
        assert_eq!(change_pct(0.0, 3.0), None);
        assert_eq!(change_pct(4.0, 2.0), Some(-50.0));
    }
}
