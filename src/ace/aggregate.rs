use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::info;

use crate::ace::types::{
    CbdComparison, OffenderStats, RepeatOffender, RouteCount, RouteShift, StopHotspot,
    SummaryOptions, Violation, ViolationSummary,
};
use crate::ace::utility::{change_pct, mean, per_day, stddev};

/// Aggregates violation rows into route, offender, CBD and hotspot views.
pub fn summarize(
    violations: &[Violation],
    skipped_rows: usize,
    options: &SummaryOptions,
) -> ViolationSummary {
    let summary = ViolationSummary {
        generated_at: Utc::now(),
        total_violations: violations.len(),
        skipped_rows,
        routes: route_counts(violations),
        offenders: offender_stats(violations, options.repeat_threshold),
        repeat_offenders: repeat_offenders(violations, options.repeat_threshold, options.top_n),
        cbd: cbd_comparison(violations, options.cutover, &options.cbd_routes),
        hotspots: stop_hotspots(violations),
    };

    info!(
        total = summary.total_violations,
        routes = summary.routes.len(),
        repeat_vehicles = summary.offenders.repeat_vehicles,
        hotspots = summary.hotspots.len(),
        "Violation summary built"
    );
    summary
}

/// Violations per route, busiest first, ties broken by route id.
pub fn route_counts(violations: &[Violation]) -> Vec<RouteCount> {
    let mut by_route: BTreeMap<&str, (usize, HashSet<&str>)> = BTreeMap::new();

    for v in violations {
        let Some(route) = v.route() else { continue };
        let entry = by_route.entry(route).or_default();
        entry.0 += 1;
        if let Some(vehicle) = v.vehicle() {
            entry.1.insert(vehicle);
        }
    }

    let mut routes: Vec<RouteCount> = by_route
        .into_iter()
        .map(|(route_id, (violations, vehicles))| RouteCount {
            route_id: route_id.to_string(),
            violations,
            distinct_vehicles: vehicles.len(),
        })
        .collect();

    // BTreeMap order is already by id, so a stable sort keeps ties ordered
    routes.sort_by(|a, b| b.violations.cmp(&a.violations));
    routes
}

fn per_vehicle(violations: &[Violation]) -> BTreeMap<&str, (usize, BTreeSet<&str>)> {
    let mut by_vehicle: BTreeMap<&str, (usize, BTreeSet<&str>)> = BTreeMap::new();
    for v in violations {
        let Some(vehicle) = v.vehicle() else { continue };
        let entry = by_vehicle.entry(vehicle).or_default();
        entry.0 += 1;
        if let Some(route) = v.route() {
            entry.1.insert(route);
        }
    }
    by_vehicle
}

pub fn offender_stats(violations: &[Violation], repeat_threshold: usize) -> OffenderStats {
    let counts: Vec<f64> = per_vehicle(violations)
        .values()
        .map(|(n, _)| *n as f64)
        .collect();
    let avg = mean(&counts);

    OffenderStats {
        vehicles: counts.len(),
        repeat_vehicles: counts
            .iter()
            .filter(|n| **n as usize >= repeat_threshold)
            .count(),
        mean_per_vehicle: avg,
        stddev_per_vehicle: stddev(&counts, avg),
    }
}

/// Vehicles with at least `repeat_threshold` violations, worst first.
pub fn repeat_offenders(
    violations: &[Violation],
    repeat_threshold: usize,
    top_n: usize,
) -> Vec<RepeatOffender> {
    let mut offenders: Vec<RepeatOffender> = per_vehicle(violations)
        .into_iter()
        .filter(|(_, (n, _))| *n >= repeat_threshold)
        .map(|(vehicle_id, (violations, routes))| RepeatOffender {
            vehicle_id: vehicle_id.to_string(),
            violations,
            routes: routes.into_iter().map(str::to_string).collect(),
        })
        .collect();

    offenders.sort_by(|a, b| b.violations.cmp(&a.violations));
    offenders.truncate(top_n);
    offenders
}

/// Splits dated violations at `cutover` and compares daily rates per route.
///
/// The before window runs from the earliest dated violation up to (not
/// including) the cutover day, the after window from the cutover day through
/// the latest. Each window counts as at least one day.
pub fn cbd_comparison(
    violations: &[Violation],
    cutover: NaiveDate,
    cbd_routes: &[String],
) -> CbdComparison {
    let dated: Vec<(NaiveDate, &Violation)> = violations
        .iter()
        .filter_map(|v| v.occurred_at().map(|ts| (ts.date(), v)))
        .collect();
    let undated = violations.len() - dated.len();

    let earliest = dated.iter().map(|(d, _)| *d).min();
    let latest = dated.iter().map(|(d, _)| *d).max();

    let days_before = earliest
        .filter(|d| *d < cutover)
        .map(|d| (cutover - d).num_days())
        .unwrap_or(0)
        .max(1);
    let days_after = latest
        .filter(|d| *d >= cutover)
        .map(|d| (d - cutover).num_days() + 1)
        .unwrap_or(0)
        .max(1);

    let mut by_route: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (date, v) in &dated {
        let Some(route) = v.route() else { continue };
        let entry = by_route.entry(route).or_default();
        if *date < cutover {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    let mut cmp = CbdComparison {
        cutover,
        days_before,
        days_after,
        undated,
        cbd_before: 0,
        cbd_after: 0,
        non_cbd_before: 0,
        non_cbd_after: 0,
        routes: Vec::with_capacity(by_route.len()),
    };

    for (route_id, (before, after)) in by_route {
        let cbd = cbd_routes.iter().any(|r| r == route_id);
        if cbd {
            cmp.cbd_before += before;
            cmp.cbd_after += after;
        } else {
            cmp.non_cbd_before += before;
            cmp.non_cbd_after += after;
        }

        let before_per_day = per_day(before, days_before);
        let after_per_day = per_day(after, days_after);
        cmp.routes.push(RouteShift {
            route_id: route_id.to_string(),
            cbd,
            before,
            after,
            before_per_day,
            after_per_day,
            change_pct: change_pct(before_per_day, after_per_day),
        });
    }

    cmp
}

/// Violations per stop placed at their mean coordinate; stops with no
/// usable coordinates are left out.
pub fn stop_hotspots(violations: &[Violation]) -> Vec<StopHotspot> {
    struct Acc<'a> {
        name: &'a str,
        lats: Vec<f64>,
        lons: Vec<f64>,
        count: usize,
    }

    let mut by_stop: BTreeMap<&str, Acc> = BTreeMap::new();
    for v in violations {
        let Some(stop) = v.stop() else { continue };
        let acc = by_stop.entry(stop).or_insert_with(|| Acc {
            name: v.stop_name.as_deref().map(str::trim).unwrap_or_default(),
            lats: Vec::new(),
            lons: Vec::new(),
            count: 0,
        });
        acc.count += 1;
        if let Some((lat, lon)) = v.coords() {
            acc.lats.push(lat);
            acc.lons.push(lon);
        }
    }

    let mut hotspots: Vec<StopHotspot> = by_stop
        .into_iter()
        .filter(|(_, acc)| !acc.lats.is_empty())
        .map(|(stop_id, acc)| StopHotspot {
            stop_id: stop_id.to_string(),
            stop_name: acc.name.to_string(),
            lat: mean(&acc.lats),
            lon: mean(&acc.lons),
            violations: acc.count,
        })
        .collect();

    hotspots.sort_by(|a, b| b.violations.cmp(&a.violations));
    hotspots
}
