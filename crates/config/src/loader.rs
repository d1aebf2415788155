use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    tracing::{debug, info},
};

use crate::schema::Config;

/// Default config location: `~/.config/snagbot/config.toml`.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("snagbot").join("config.toml"))
}

/// Load configuration.
///
/// An explicitly given path must exist and parse. Without one, the default
/// location is used when present; otherwise the built-in defaults apply.
pub fn load(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        return Ok(config);
    }

    if let Some(path) = default_path()
        && path.exists()
    {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        return Ok(config);
    }

    debug!("no config file found, using defaults");
    Ok(Config::default())
}
