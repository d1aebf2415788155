use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{FormatInfo, VideoDetails, VideoHit},
};

/// The video provider and download tool, behind one seam.
///
/// Implemented by [`crate::ytdlp::YtDlp`] in production and by in-memory
/// fakes in plugin tests.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Search the provider, returning up to `limit` ordered hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoHit>>;

    /// Fetch full metadata for a single video URL.
    async fn probe(&self, url: &str) -> Result<VideoDetails>;

    /// List the downloadable formats for a URL, in the tool's order.
    async fn list_formats(&self, url: &str) -> Result<Vec<FormatInfo>>;

    /// Download `url` with a format selector, writing exactly `out`.
    async fn download_video(&self, url: &str, selector: &str, out: &Path) -> Result<PathBuf>;

    /// Download the best audio for `url` as mp3, writing exactly `out`.
    async fn download_audio(&self, url: &str, out: &Path) -> Result<PathBuf>;
}
