//! Concurrent download of the MTA borough GTFS zips.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, warn};

use super::{HttpClient, fetch_bytes};
use crate::error::MapError;

/// Borough feed codes published by the MTA (`gtfs_<code>.zip`).
pub const BOROUGHS: &[&str] = &["bx", "b", "m", "q", "si", "busco"];

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

pub fn feed_url(base_url: &str, borough: &str) -> String {
    format!("{}/gtfs_{}.zip", base_url.trim_end_matches('/'), borough)
}

/// Fetches `gtfs_<b>.zip` for every borough into `folder`, at most
/// `concurrency` at a time. Codes outside [`BOROUGHS`] are rejected before
/// anything is fetched. Individual failures are reported; only a run in
/// which every download fails is an error.
#[tracing::instrument(skip(client), fields(folder = %folder.display()))]
pub async fn download_feeds<C: HttpClient + 'static>(
    client: Arc<C>,
    base_url: &str,
    boroughs: &[String],
    folder: &Path,
    concurrency: usize,
) -> Result<DownloadReport> {
    if let Some(bad) = boroughs.iter().find(|b| !BOROUGHS.contains(&b.as_str())) {
        return Err(MapError::UnknownBorough(bad.clone()).into());
    }

    std::fs::create_dir_all(folder)?;

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = vec![];

    for borough in boroughs {
        let sem = semaphore.clone();
        let client = client.clone();
        let url = feed_url(base_url, borough);
        let target = folder.join(format!("gtfs_{borough}.zip"));
        let borough = borough.clone();

        let span = tracing::info_span!("download_feed", borough = %borough, url = %url);
        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire().await?;

                let started = std::time::Instant::now();
                let bytes = fetch_bytes(client.as_ref(), &url).await?;
                let elapsed = started.elapsed();
                if elapsed.as_secs() > 30 {
                    warn!(elapsed_secs = elapsed.as_secs(), "Feed download was slow");
                }

                tokio::fs::write(&target, &bytes).await?;
                info!(bytes = bytes.len(), path = %target.display(), "Feed saved");
                anyhow::Ok(target)
            }
            .instrument(span),
        );
        tasks.push((borough, task));
    }

    let mut report = DownloadReport::default();
    for (borough, task) in tasks {
        match task.await {
            Ok(Ok(path)) => report.saved.push(path),
            Ok(Err(e)) => {
                error!(borough = %borough, error = %e, "Feed download failed");
                report.failed.push((borough, e.to_string()));
            }
            Err(e) => {
                error!(borough = %borough, error = %e, "Download task panicked");
                report.failed.push((borough, e.to_string()));
            }
        }
    }

    if report.saved.is_empty() && !report.failed.is_empty() {
        return Err(MapError::AllDownloadsFailed(report.failed.len()).into());
    }

    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "Downloads finished"
    );
    Ok(report)
}
