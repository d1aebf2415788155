//! Config schema. Every section and field has a serde default so a missing
//! or partial config file always yields a runnable configuration.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub downloads: DownloadConfig,
    pub ytdlp: YtDlpConfig,
    pub tiktok: TikTokConfig,
}

/// Bot-wide behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix that marks a message as a command.
    pub command_prefix: String,
    /// Seconds of inactivity before a pending session expires.
    pub session_timeout_secs: u64,
    /// Caption attached to uploaded files.
    pub caption: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".into(),
            session_timeout_secs: 150,
            caption: "© snagbot".into(),
        }
    }
}

/// Where downloads land and how they are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Working directory for downloaded files.
    pub dir: PathBuf,
    /// Files larger than this are sent "as document".
    pub document_threshold_mb: u64,
    /// Video files smaller than this are remuxed to mp4 before upload.
    pub remux_under_mb: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("downloads"),
            document_threshold_mb: 64,
            remux_under_mb: 50,
        }
    }
}

/// yt-dlp invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    /// Binary name or absolute path.
    pub binary: String,
    /// Optional cookies file passed to every invocation.
    pub cookies_file: Option<PathBuf>,
    /// Number of hits requested per search.
    pub search_limit: usize,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".into(),
            cookies_file: None,
            search_limit: 10,
        }
    }
}

/// TikTok watermark-free resolver endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TikTokConfig {
    pub api_base: String,
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api-pink-venom.vercel.app/api/tiktok".into(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.bot.session_timeout_secs)
    }

    #[must_use]
    pub fn document_threshold_bytes(&self) -> u64 {
        self.downloads.document_threshold_mb * 1024 * 1024
    }

    #[must_use]
    pub fn remux_under_bytes(&self) -> u64 {
        self.downloads.remux_under_mb * 1024 * 1024
    }
}
