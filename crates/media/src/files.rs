//! Filename hygiene and cleanup helpers.

use std::path::Path;

use tracing::warn;

const MAX_NAME_LEN: usize = 100;

/// Make a video title safe to use as a filename: everything outside
/// `[A-Za-z0-9_-]` becomes `_`, capped at 100 characters.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    sanitized.truncate(MAX_NAME_LEN);
    if sanitized.is_empty() {
        sanitized.push_str("media");
    }
    sanitized
}

/// Delete a file if it exists, logging failures instead of returning them.
/// Cleanup paths must never mask the original outcome.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {},
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}
