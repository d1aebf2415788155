//! External media tooling: the yt-dlp executor, ffmpeg remuxing, HTTP
//! fetch helpers, and the shared media types.

pub mod convert;
pub mod error;
pub mod fetch;
pub mod files;
pub mod source;
pub mod types;
pub mod ytdlp;

pub use {
    error::{Error, Result},
    source::MediaSource,
    types::{DEFAULT_VIDEO_SELECTOR, FormatInfo, QUALITY_TIERS, QualityTier, VideoDetails, VideoHit},
    ytdlp::YtDlp,
};
