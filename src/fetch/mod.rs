mod basic;
mod client;
pub mod download;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use download::{BOROUGHS, DownloadReport, download_feeds};

use anyhow::Result;

/// GETs `url` and returns the body. Non-2xx responses are errors.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
