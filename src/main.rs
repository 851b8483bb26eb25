//! CLI entry point for the MTA bus stop mapper.
//!
//! Provides subcommands for downloading the borough GTFS feeds, mapping every
//! bus stop, exporting the cleaned stops and summarizing ACE violations.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mta_bus_map::ace::aggregate::summarize;
use mta_bus_map::ace::load::load_violations;
use mta_bus_map::ace::types::{SummaryOptions, default_cbd_routes, default_cutover};
use mta_bus_map::{
    fetch::{BOROUGHS, BasicClient, download_feeds},
    map::{MapOptions, render_map, write_map},
    output::{append_record, print_json, write_json, write_stops_csv},
    pipeline::{StopSet, build_stop_set},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_BASE_URL: &str = "https://rrgtfsfeeds.s3.amazonaws.com";

#[derive(Parser)]
#[command(name = "mta_bus_map")]
#[command(about = "Map MTA bus stops and analyze ACE camera violations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the borough GTFS zips from the MTA
    Download {
        /// Folder to save gtfs_*.zip files into
        #[arg(short, long, env = "GTFS_FOLDER", default_value = "bus_gtfs")]
        folder: PathBuf,

        /// Base URL the gtfs_<borough>.zip files are published under
        #[arg(long, env = "GTFS_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Borough codes to fetch (bx, b, m, q, si, busco); all when omitted
        #[arg(short, long = "borough")]
        boroughs: Vec<String>,

        /// Maximum number of concurrent downloads
        #[arg(short, long, default_value_t = 3)]
        concurrency: usize,
    },
    /// Render every stop from the GTFS zips on an interactive HTML map
    Map {
        /// Folder containing gtfs_*.zip files
        #[arg(short, long, env = "GTFS_FOLDER", default_value = "bus_gtfs")]
        folder: PathBuf,

        /// HTML file to write
        #[arg(short, long, default_value = "mta_bus_map.html")]
        output: PathBuf,

        /// Only map these borough feeds (e.g. gtfs_m); repeatable
        #[arg(long = "feed")]
        feeds: Vec<String>,

        /// Stop dot radius in pixels
        #[arg(short, long, default_value_t = 1.8)]
        radius: f64,

        /// Optional ACE violations CSV to overlay as hotspots
        #[arg(long)]
        violations: Option<PathBuf>,

        /// CSV file to append per-feed load statistics to
        #[arg(long)]
        run_log: Option<PathBuf>,

        /// Don't open the map in a browser
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },
    /// Export the cleaned, de-duplicated stops as CSV
    Stops {
        /// Folder containing gtfs_*.zip files
        #[arg(short, long, env = "GTFS_FOLDER", default_value = "bus_gtfs")]
        folder: PathBuf,

        /// CSV file to write
        #[arg(short, long, default_value = "stops.csv")]
        output: PathBuf,

        /// Only export these borough feeds; repeatable
        #[arg(long = "feed")]
        feeds: Vec<String>,

        /// Gzip compress the export
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// CSV file to append per-feed load statistics to
        #[arg(long)]
        run_log: Option<PathBuf>,
    },
    /// Summarize an ACE violations CSV export
    Violations {
        /// Path to the violations CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// JSON file to write the summary to
        #[arg(short, long, default_value = "ace_summary.json")]
        output: PathBuf,

        /// Minimum violations for a vehicle to count as a repeat offender
        #[arg(long, default_value_t = 2)]
        repeat_threshold: usize,

        /// Number of repeat offenders to keep
        #[arg(long, default_value_t = 25)]
        top: usize,

        /// First day of the "after" window (YYYY-MM-DD); defaults to congestion pricing start
        #[arg(long)]
        cutover: Option<NaiveDate>,

        /// Routes counted as CBD routes; repeatable, replaces the default list
        #[arg(long = "cbd-route")]
        cbd_routes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mta_bus_map.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mta_bus_map.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            folder,
            base_url,
            boroughs,
            concurrency,
        } => {
            let boroughs = if boroughs.is_empty() {
                BOROUGHS.iter().map(|b| b.to_string()).collect()
            } else {
                boroughs
            };
            let client = Arc::new(BasicClient::new()?);
            let report = download_feeds(client, &base_url, &boroughs, &folder, concurrency).await?;
            for (borough, reason) in &report.failed {
                warn!(borough = %borough, reason = %reason, "Feed not downloaded");
            }
        }
        Commands::Map {
            folder,
            output,
            feeds,
            radius,
            violations,
            run_log,
            no_open,
        } => {
            let set = build_stop_set(&folder, &feeds)?;
            log_run(&set, run_log.as_deref());
            info!(total_stops = set.stops.len(), "Stops ready to map");

            let hotspots = match violations {
                Some(path) => {
                    let loaded = load_violations(&path)?;
                    summarize(&loaded.rows, loaded.skipped, &SummaryOptions::default()).hotspots
                }
                None => Vec::new(),
            };

            let options = MapOptions {
                radius,
                ..MapOptions::default()
            };
            let html = render_map(&set.stops, &hotspots, &options)?;
            let out = write_map(&output, &html)?;

            if !no_open {
                if let Err(e) = open::that(&out) {
                    warn!(error = %e, path = %out.display(), "Could not open browser");
                }
            }
        }
        Commands::Stops {
            folder,
            output,
            feeds,
            gzip,
            run_log,
        } => {
            let set = build_stop_set(&folder, &feeds)?;
            log_run(&set, run_log.as_deref());
            write_stops_csv(&output, &set.stops, gzip)?;
        }
        Commands::Violations {
            input,
            output,
            repeat_threshold,
            top,
            cutover,
            cbd_routes,
        } => {
            let options = SummaryOptions {
                repeat_threshold,
                top_n: top,
                cutover: cutover.unwrap_or_else(default_cutover),
                cbd_routes: if cbd_routes.is_empty() {
                    default_cbd_routes()
                } else {
                    cbd_routes
                },
            };

            let loaded = load_violations(&input)?;
            let summary = summarize(&loaded.rows, loaded.skipped, &options);

            for route in summary.routes.iter().take(10) {
                info!(
                    route = %route.route_id,
                    violations = route.violations,
                    vehicles = route.distinct_vehicles,
                    "Route"
                );
            }
            print_json(&summary.offenders)?;
            info!(
                cutover = %summary.cbd.cutover,
                cbd_before = summary.cbd.cbd_before,
                cbd_after = summary.cbd.cbd_after,
                non_cbd_before = summary.cbd.non_cbd_before,
                non_cbd_after = summary.cbd.non_cbd_after,
                "CBD before/after"
            );

            write_json(&output, &summary)?;
        }
    }

    Ok(())
}

/// Logs per-feed statistics and appends them to the run log when one is set.
fn log_run(set: &StopSet, run_log: Option<&Path>) {
    for feed in &set.feeds {
        info!(
            feed = %feed.borough_feed,
            has_stops_txt = feed.has_stops_txt,
            rows_read = feed.rows_read,
            kept = feed.stops_kept,
            kept_pct = feed.kept_pct(),
            "Feed loaded"
        );

        if let Some(path) = run_log {
            if let Err(e) = append_record(path, feed) {
                error!(error = %e, "Failed to append run log");
            }
        }
    }
}
