//! TOML configuration schema and loader.

pub mod loader;
pub mod schema;

pub use {
    loader::load,
    schema::{BotConfig, Config, DownloadConfig, TikTokConfig, YtDlpConfig},
};
