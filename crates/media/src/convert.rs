//! ffmpeg remux step applied to small downloads before upload, so chats
//! that inline-play mp4 get a playable file instead of a matroska blob.

use std::path::{Path, PathBuf};

use {tokio::process::Command, tracing::debug};

use crate::error::{Error, Result};

/// The ffmpeg binary, when present on the host.
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Ffmpeg {
    /// Find ffmpeg on `PATH`. Absence is not an error: callers fall back
    /// to sending the original file.
    #[must_use]
    pub fn discover() -> Option<Self> {
        which::which("ffmpeg").ok().map(|binary| Self { binary })
    }

    /// Re-encode `input` to an mp4 next to it. On success the input file is
    /// removed and the new path returned.
    pub async fn to_mp4(&self, input: &Path) -> Result<PathBuf> {
        let out = converted_path(input);
        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c:v", "libx264", "-preset", "fast", "-c:a", "aac"])
            .arg(&out)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::external("failed to run ffmpeg", e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool("ffmpeg", output.status, stderr.trim().to_string()));
        }
        if !tokio::fs::try_exists(&out).await.unwrap_or(false) {
            return Err(Error::MissingOutput { path: out });
        }
        debug!(input = %input.display(), out = %out.display(), "re-encoded to mp4");
        let _ = tokio::fs::remove_file(input).await;
        Ok(out)
    }
}

/// `clip.mkv` → `clip_converted.mp4`, in the same directory.
fn converted_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_converted.mp4"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_path_replaces_the_extension() {
        assert_eq!(
            converted_path(Path::new("/tmp/dl/clip.mkv")),
            Path::new("/tmp/dl/clip_converted.mp4")
        );
        assert_eq!(
            converted_path(Path::new("clip")),
            Path::new("clip_converted.mp4")
        );
    }
}
