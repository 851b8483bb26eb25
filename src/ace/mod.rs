//! ACE (Automated Camera Enforcement) violation analysis.
//!
//! Loads the NYC Open Data violations export, then answers three questions:
//! which routes see the most violations, which vehicles are repeat
//! offenders, and how violation rates on CBD routes shifted once congestion
//! pricing began. Per-stop hotspots feed the map overlay.

pub mod aggregate;
pub mod load;
pub mod types;
pub mod utility;
