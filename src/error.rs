//! Domain failures the CLI reports distinctly from plain I/O errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// The GTFS folder does not exist.
    #[error("GTFS folder {0} does not exist")]
    FolderMissing(PathBuf),

    /// No `gtfs_*.zip` files were found.
    #[error("no GTFS zips found in {0}/gtfs_*.zip")]
    NoZips(PathBuf),

    /// Every zip was missing `stops.txt`.
    #[error("no stops.txt found in any zip")]
    NoStops,

    /// Nothing left to draw after cleaning and filtering.
    #[error("no stops with valid coordinates to map")]
    EmptyMap,

    /// A borough code outside the published feed set.
    #[error("unknown borough code '{0}' (expected one of bx, b, m, q, si, busco)")]
    UnknownBorough(String),

    /// Every requested download failed.
    #[error("all {0} feed downloads failed")]
    AllDownloadsFailed(usize),
}
