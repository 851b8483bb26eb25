use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::ace::types::Violation;

/// Violation rows plus the count of rows that failed to deserialize.
#[derive(Debug, Default)]
pub struct LoadedViolations {
    pub rows: Vec<Violation>,
    pub skipped: usize,
}

/// Reads an ACE violations CSV export from disk.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_violations(path: &Path) -> Result<LoadedViolations> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = read_violations(file)?;
    info!(rows = loaded.rows.len(), skipped = loaded.skipped, "Loaded violations");
    Ok(loaded)
}

/// Deserializes violations from any reader. Malformed rows are skipped, not fatal.
pub fn read_violations<R: Read>(reader: R) -> Result<LoadedViolations> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut loaded = LoadedViolations::default();
    for (line, result) in rdr.deserialize::<Violation>().enumerate() {
        match result {
            Ok(row) => loaded.rows.push(row),
            Err(e) => {
                debug!(line = line + 2, error = %e, "Skipping malformed violation row");
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}
