//! Provider URL validation and normalization.
//!
//! Only the documented link forms are accepted; everything else is rejected
//! before any external tool sees the input.

use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").unwrap()
});
static FACEBOOK_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(facebook\.com|fb\.watch)/.+$").unwrap()
});
static FACEBOOK_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:videos|share/(?:v|r))/([A-Za-z0-9]+)").unwrap());

/// Canonicalize a YouTube link (watch, short, or shorts form) to
/// `https://youtu.be/<id>`. Returns `None` for anything else.
#[must_use]
pub fn normalize_youtube(url: &str) -> Option<String> {
    if !YOUTUBE_HOST.is_match(url) {
        return None;
    }
    let clean = url.split('?').next().unwrap_or(url);

    let id = if let Some((_, rest)) = clean.split_once("/shorts/") {
        rest.trim_end_matches('/')
    } else if clean.contains("youtu.be/") {
        clean.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    } else if clean.contains("youtube.com/watch") {
        url.split_once('?')?
            .1
            .split('&')
            .find_map(|kv| kv.strip_prefix("v="))?
    } else {
        return None;
    };

    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return None;
    }
    Some(format!("https://youtu.be/{id}"))
}

/// Canonicalize a Facebook video link (`/videos/`, `/share/v/`, `/share/r/`
/// forms) to `https://www.facebook.com/share/v/<id>`.
#[must_use]
pub fn normalize_facebook(url: &str) -> Option<String> {
    if !FACEBOOK_HOST.is_match(url) {
        return None;
    }
    let id = FACEBOOK_VIDEO_ID.captures(url)?.get(1)?.as_str();
    Some(format!("https://www.facebook.com/share/v/{id}"))
}

/// Loose check used by the formats flow, which accepts any http(s) URL.
#[must_use]
pub fn is_http_url(text: &str) -> bool {
    static HTTP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());
    HTTP.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_watch_form() {
        assert_eq!(
            normalize_youtube("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(
            normalize_youtube("https://www.youtube.com/watch?list=PL123&v=abc_-123").as_deref(),
            Some("https://youtu.be/abc_-123")
        );
    }

    #[test]
    fn youtube_short_form() {
        assert_eq!(
            normalize_youtube("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(
            normalize_youtube("https://youtu.be/dQw4w9WgXcQ?t=42").as_deref(),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn youtube_shorts_form() {
        assert_eq!(
            normalize_youtube("https://www.youtube.com/shorts/abc123XYZ/").as_deref(),
            Some("https://youtu.be/abc123XYZ")
        );
    }

    #[test]
    fn youtube_rejects_other_hosts_and_junk() {
        assert_eq!(normalize_youtube("https://vimeo.com/12345"), None);
        assert_eq!(normalize_youtube("not a url"), None);
        assert_eq!(normalize_youtube("https://www.youtube.com/watch"), None);
        assert_eq!(normalize_youtube("https://youtube.com/channel/UCabc"), None);
    }

    #[test]
    fn facebook_forms() {
        assert_eq!(
            normalize_facebook("https://www.facebook.com/SomePage/videos/981948876160874/")
                .as_deref(),
            Some("https://www.facebook.com/share/v/981948876160874")
        );
        assert_eq!(
            normalize_facebook("https://www.facebook.com/share/v/AbC123/?mibextid=xyz").as_deref(),
            Some("https://www.facebook.com/share/v/AbC123")
        );
        assert_eq!(
            normalize_facebook("https://www.facebook.com/share/r/XyZ789/").as_deref(),
            Some("https://www.facebook.com/share/v/XyZ789")
        );
    }

    #[test]
    fn facebook_rejects_other_hosts() {
        assert_eq!(normalize_facebook("https://example.com/videos/123"), None);
        assert_eq!(normalize_facebook("https://facebook.com/profile/someone"), None);
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://example.com/v/1"));
        assert!(is_http_url("http://host/path"));
        assert!(!is_http_url("ftp://host/path"));
        assert!(!is_http_url("https://has space"));
        assert!(!is_http_url("plain text"));
    }
}
