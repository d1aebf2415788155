//! Shared media types: search hits, probe results, format listings, and
//! the fixed quality tiers.

/// A search hit from the video provider.
#[derive(Debug, Clone)]
pub struct VideoHit {
    pub id: String,
    pub title: String,
    /// "M:SS"-style duration, when known.
    pub duration: Option<String>,
    pub channel: Option<String>,
}

impl VideoHit {
    /// Canonical short URL for this hit.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }
}

/// Full metadata for a single video, as probed from the source.
#[derive(Debug, Clone)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub duration: Option<String>,
    pub views: Option<u64>,
    pub channel: Option<String>,
    /// Upload date in "YYYY-MM-DD" form, when known.
    pub published: Option<String>,
    pub thumbnail: Option<String>,
}

impl VideoDetails {
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }
}

/// One row of a `--list-formats` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatInfo {
    /// Format id, passed back to the downloader verbatim.
    pub id: String,
    /// "640x360", "audio", or "unknown".
    pub resolution: String,
    /// Approximate size as printed by the tool, e.g. "8.79MiB".
    pub size: Option<String>,
}

/// A fixed quality tier offered by the quality-select flow.
#[derive(Debug, Clone, Copy)]
pub struct QualityTier {
    pub label: &'static str,
    /// yt-dlp format selector for this tier.
    pub selector: &'static str,
}

/// The tier menu presented by the quality-select flow, in display order.
pub const QUALITY_TIERS: &[QualityTier] = &[
    QualityTier {
        label: "360p",
        selector: "bestvideo[height<=360][vcodec=vp9]+bestaudio/best[height<=360][ext=mkv]",
    },
    QualityTier {
        label: "480p",
        selector: "bestvideo[height<720][vcodec=vp9]+bestaudio/best[height<720][ext=mkv]",
    },
    QualityTier {
        label: "720p",
        selector: "bestvideo[height<1080][vcodec=vp9]+bestaudio/best[height<1080][ext=mkv]",
    },
    QualityTier {
        label: "1080p",
        selector: "bestvideo[height<=1080][vcodec=vp9]+bestaudio/best[height<=1080][ext=mkv]",
    },
    QualityTier {
        label: "HQ (shorts only)",
        selector: "bestvideo[height<=1920][vcodec=vp9]+bestaudio/best[height<=1920][ext=mkv]",
    },
];

/// Selector used when a flow downloads video without asking for a tier.
pub const DEFAULT_VIDEO_SELECTOR: &str =
    "bestvideo[height<=1080][vcodec=vp9]+bestaudio/best[height<=1080][ext=mkv]";

/// Render whole seconds as "H:MM:SS" or "M:SS".
#[must_use]
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
