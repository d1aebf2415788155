//! In-memory Transport and MediaSource fakes for plugin tests.

use std::{
    path::{Path, PathBuf},
    sync::{
        Mutex as StdMutex,
        atomic::{AtomicU64, Ordering},
    },
};

use {anyhow::Result, async_trait::async_trait};

use {
    snagbot_channels::Transport,
    snagbot_common::types::{InboundMessage, MessageRef},
    snagbot_media::{
        MediaSource,
        error::{Error, Result as MediaResult},
        types::{FormatInfo, VideoDetails, VideoHit},
    },
};

/// Config pointing downloads at a temp dir, with remuxing disabled so the
/// fakes' tiny files never hit a real ffmpeg.
pub(crate) fn test_config(dir: &Path) -> snagbot_config::Config {
    let mut config = snagbot_config::Config::default();
    config.downloads.dir = dir.to_path_buf();
    config.downloads.remux_under_mb = 0;
    config
}

pub(crate) fn msg(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat: "chat-1".into(),
        sender: sender.into(),
        text: text.into(),
        id: "in-1".into(),
        quoted_id: None,
    }
}

pub(crate) fn quoting(sender: &str, text: &str, quoted: &str) -> InboundMessage {
    InboundMessage {
        quoted_id: Some(quoted.into()),
        ..msg(sender, text)
    }
}

#[derive(Default)]
pub(crate) struct MockTransport {
    next_id: AtomicU64,
    /// (chat, text)
    pub replies: StdMutex<Vec<(String, String)>>,
    /// (chat, filename, as_document)
    pub files: StdMutex<Vec<(String, String, bool)>>,
    pub reactions: StdMutex<Vec<String>>,
}

impl MockTransport {
    fn next_ref(&self) -> MessageRef {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        MessageRef::new(format!("out-{n}"))
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn last_reply(&self) -> String {
        self.reply_texts().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn reply(&self, chat: &str, text: &str) -> Result<MessageRef> {
        self.replies
            .lock()
            .unwrap()
            .push((chat.to_string(), text.to_string()));
        Ok(self.next_ref())
    }

    async fn send_file(
        &self,
        chat: &str,
        _file: &Path,
        filename: &str,
        _caption: &str,
        as_document: bool,
    ) -> Result<MessageRef> {
        self.files
            .lock()
            .unwrap()
            .push((chat.to_string(), filename.to_string(), as_document));
        Ok(self.next_ref())
    }

    async fn send_photo(&self, _chat: &str, _image: &[u8], _caption: &str) -> Result<MessageRef> {
        Ok(self.next_ref())
    }

    async fn react(&self, _chat: &str, _message_id: &str, emoji: &str) -> Result<()> {
        self.reactions.lock().unwrap().push(emoji.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockSource {
    pub hits: Vec<VideoHit>,
    pub details: Option<VideoDetails>,
    pub formats: Vec<FormatInfo>,
    pub fail_downloads: bool,
    /// (url, selector)
    pub video_downloads: StdMutex<Vec<(String, String)>>,
    pub audio_downloads: StdMutex<Vec<String>>,
}

impl MockSource {
    pub fn hit(id: &str, title: &str) -> VideoHit {
        VideoHit {
            id: id.into(),
            title: title.into(),
            duration: Some("4:13".into()),
            channel: Some("Channel".into()),
        }
    }

    pub fn details(title: &str) -> VideoDetails {
        VideoDetails {
            id: "vid-1".into(),
            title: title.into(),
            duration: Some("4:13".into()),
            views: Some(1000),
            channel: Some("Channel".into()),
            published: Some("2024-01-31".into()),
            // No thumbnail: plugin tests must not fetch over the network.
            thumbnail: None,
        }
    }
}

#[async_trait]
impl MediaSource for MockSource {
    async fn search(&self, _query: &str, limit: usize) -> MediaResult<Vec<VideoHit>> {
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    async fn probe(&self, _url: &str) -> MediaResult<VideoDetails> {
        self.details
            .clone()
            .ok_or_else(|| Error::invalid_input("no such video"))
    }

    async fn list_formats(&self, _url: &str) -> MediaResult<Vec<FormatInfo>> {
        Ok(self.formats.clone())
    }

    async fn download_video(&self, url: &str, selector: &str, out: &Path) -> MediaResult<PathBuf> {
        self.video_downloads
            .lock()
            .unwrap()
            .push((url.to_string(), selector.to_string()));
        if self.fail_downloads {
            return Err(Error::invalid_input("download failed"));
        }
        tokio::fs::write(out, b"video bytes")
            .await
            .map_err(|e| Error::external("write", e))?;
        Ok(out.to_path_buf())
    }

    async fn download_audio(&self, url: &str, out: &Path) -> MediaResult<PathBuf> {
        self.audio_downloads.lock().unwrap().push(url.to_string());
        if self.fail_downloads {
            return Err(Error::invalid_input("download failed"));
        }
        tokio::fs::write(out, b"audio bytes")
            .await
            .map_err(|e| Error::external("write", e))?;
        Ok(out.to_path_buf())
    }
}
