//! Small HTTP helpers: thumbnails into memory, media URLs onto disk.

use std::path::{Path, PathBuf};

use {futures::StreamExt, tokio::io::AsyncWriteExt, tracing::debug};

use crate::error::{Error, Result};

/// Fetch a URL into memory. Used for thumbnails, so responses are expected
/// to be small.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| Error::external(format!("fetching {url}"), e))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::external(format!("reading {url}"), e))?;
    Ok(bytes.to_vec())
}

/// Stream a URL to a local file.
pub async fn download_to_file(client: &reqwest::Client, url: &str, out: &Path) -> Result<PathBuf> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| Error::external(format!("fetching {url}"), e))?;

    let mut file = tokio::fs::File::create(out)
        .await
        .map_err(|e| Error::external(format!("creating {}", out.display()), e))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::external(format!("reading {url}"), e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::external(format!("writing {}", out.display()), e))?;
    }
    file.flush()
        .await
        .map_err(|e| Error::external(format!("writing {}", out.display()), e))?;
    debug!(url, out = %out.display(), "downloaded");
    Ok(out.to_path_buf())
}
