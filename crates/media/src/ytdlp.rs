//! yt-dlp executor: search, metadata probe, format listing, download.
//!
//! All provider access goes through the external binary; this module owns
//! the argument construction and the parsing of its JSON and table output.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use {
    async_trait::async_trait,
    regex::Regex,
    serde::Deserialize,
    tokio::process::Command,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    source::MediaSource,
    types::{FormatInfo, VideoDetails, VideoHit, format_duration},
};

/// The yt-dlp binary plus its standing options.
pub struct YtDlp {
    binary: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    /// Resolve the binary on `PATH` (or use it verbatim when absolute).
    ///
    /// A configured cookies file that does not exist is dropped with a
    /// warning rather than passed through to every invocation.
    pub fn new(binary: &str, cookies: Option<&Path>) -> Result<Self> {
        let binary = which::which(binary)
            .map_err(|e| Error::external(format!("{binary} not found"), e))?;
        let cookies = cookies.and_then(|path| {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                warn!(path = %path.display(), "cookies file not found, ignoring");
                None
            }
        });
        Ok(Self { binary, cookies })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings");
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoHit>> {
        let mut cmd = self.command();
        cmd.arg(format!("ytsearch{limit}:{query}"))
            .args(["--flat-playlist", "-J"]);
        let stdout = run(cmd, "yt-dlp").await?;
        parse_search(&stdout)
    }

    async fn probe(&self, url: &str) -> Result<VideoDetails> {
        let mut cmd = self.command();
        cmd.args(["-J", "--no-playlist"]).arg(url);
        let stdout = run(cmd, "yt-dlp").await?;
        parse_probe(&stdout)
    }

    async fn list_formats(&self, url: &str) -> Result<Vec<FormatInfo>> {
        let mut cmd = self.command();
        cmd.arg("--list-formats").arg(url);
        let stdout = run(cmd, "yt-dlp").await?;
        Ok(parse_format_listing(&stdout))
    }

    async fn download_video(&self, url: &str, selector: &str, out: &Path) -> Result<PathBuf> {
        let mut cmd = self.command();
        cmd.args(["-f", selector]);
        if let Some(ext) = out.extension().and_then(|e| e.to_str())
            && matches!(ext, "mkv" | "mp4")
        {
            cmd.args(["--merge-output-format", ext]);
        }
        cmd.arg("-o").arg(out).arg(url);
        debug!(url, selector, out = %out.display(), "downloading video");
        run(cmd, "yt-dlp").await?;
        ensure_exists(out).await
    }

    async fn download_audio(&self, url: &str, out: &Path) -> Result<PathBuf> {
        let mut cmd = self.command();
        cmd.args([
            "-f",
            "bestaudio",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--embed-thumbnail",
        ]);
        cmd.arg("-o").arg(out).arg(url);
        debug!(url, out = %out.display(), "downloading audio");
        run(cmd, "yt-dlp").await?;
        ensure_exists(out).await
    }
}

async fn run(mut cmd: Command, tool: &'static str) -> Result<String> {
    let output = cmd
        .output()
        .await
        .map_err(|e| Error::external(format!("failed to run {tool}"), e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool(tool, output.status, stderr.trim().to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn ensure_exists(path: &Path) -> Result<PathBuf> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(path.to_path_buf()),
        _ => Err(Error::MissingOutput {
            path: path.to_path_buf(),
        }),
    }
}

#[derive(Deserialize)]
struct ProbeJson {
    id: String,
    title: String,
    duration: Option<f64>,
    view_count: Option<u64>,
    channel: Option<String>,
    uploader: Option<String>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
}

fn parse_probe(json: &str) -> Result<VideoDetails> {
    let probe: ProbeJson = serde_json::from_str(json)
        .map_err(|e| Error::external("unexpected probe output", e))?;
    Ok(VideoDetails {
        id: probe.id,
        title: probe.title,
        duration: probe.duration.map(|d| format_duration(d as u64)),
        views: probe.view_count,
        channel: probe.channel.or(probe.uploader),
        published: probe.upload_date.as_deref().and_then(format_upload_date),
        thumbnail: probe.thumbnail,
    })
}

#[derive(Deserialize)]
struct SearchJson {
    #[serde(default)]
    entries: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    id: String,
    title: String,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
}

fn parse_search(json: &str) -> Result<Vec<VideoHit>> {
    let search: SearchJson = serde_json::from_str(json)
        .map_err(|e| Error::external("unexpected search output", e))?;
    Ok(search
        .entries
        .into_iter()
        .map(|entry| VideoHit {
            id: entry.id,
            title: entry.title,
            duration: entry.duration.map(|d| format_duration(d as u64)),
            channel: entry.channel.or(entry.uploader),
        })
        .collect())
}

/// "20240131" → "2024-01-31".
fn format_upload_date(raw: &str) -> Option<String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]))
}

static RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,5}x\d{2,5}|\d{3,4}p\b|audio only)").unwrap());
static FILESIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9.]*\s?[KMG]iB)").unwrap());

/// Parse the human-readable `--list-formats` table.
///
/// Rows start after the dashed separator line; older versions print no
/// separator, so progress lines (`[...]`) and the header row are skipped
/// explicitly as well.
fn parse_format_listing(out: &str) -> Vec<FormatInfo> {
    let lines: Vec<&str> = out.lines().collect();
    let start = lines
        .iter()
        .position(|l| l.len() > 10 && l.chars().all(|c| matches!(c, '─' | '-' | '—')))
        .map(|i| i + 1)
        .unwrap_or(0);

    lines[start..]
        .iter()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('[') {
                return None;
            }
            let id = line.split_whitespace().next()?;
            if id.eq_ignore_ascii_case("id") || id.eq_ignore_ascii_case("format") {
                return None;
            }
            let resolution = RESOLUTION
                .find(line)
                .map(|m| {
                    if m.as_str() == "audio only" {
                        "audio".to_string()
                    } else {
                        m.as_str().to_string()
                    }
                })
                .unwrap_or_else(|| "unknown".to_string());
            let size = FILESIZE.find(line).map(|m| m.as_str().to_string());
            Some(FormatInfo {
                id: id.to_string(),
                resolution,
                size,
            })
        })
        .collect()
}
