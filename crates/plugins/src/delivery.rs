//! The terminal download-and-upload action shared by the workflows.
//!
//! Invoked at most once per resolved session; by the time it runs the
//! session is already gone from its store, so a failure here ends the
//! workflow and the user starts over from the command.

use std::{path::PathBuf, sync::Arc};

use tracing::warn;

use {
    snagbot_channels::{Transport, reactions},
    snagbot_common::types::InboundMessage,
    snagbot_config::Config,
    snagbot_media::{
        MediaSource,
        convert::Ffmpeg,
        files::{remove_quietly, sanitize_filename},
    },
};

pub struct Delivery {
    transport: Arc<dyn Transport>,
    source: Arc<dyn MediaSource>,
    ffmpeg: Option<Ffmpeg>,
    dir: PathBuf,
    caption: String,
    document_threshold: u64,
    remux_under: u64,
}

impl Delivery {
    pub fn new(transport: Arc<dyn Transport>, source: Arc<dyn MediaSource>, config: &Config) -> Self {
        Self {
            transport,
            source,
            ffmpeg: Ffmpeg::discover(),
            dir: config.downloads.dir.clone(),
            caption: config.bot.caption.clone(),
            document_threshold: config.document_threshold_bytes(),
            remux_under: config.remux_under_bytes(),
        }
    }

    /// Download `url` with a format selector and upload the result.
    ///
    /// `title` names the output file (after sanitization); `ext` picks the
    /// container the tool merges into.
    pub async fn video(
        &self,
        msg: &InboundMessage,
        url: &str,
        selector: &str,
        title: &str,
        ext: &str,
    ) -> anyhow::Result<()> {
        let _ = self.transport.react(&msg.chat, &msg.id, reactions::WAIT).await;
        let out = self.dir.join(format!("{}.{ext}", sanitize_filename(title)));
        match self.source.download_video(url, selector, &out).await {
            Ok(path) => self.upload(msg, path, false).await,
            Err(error) => {
                let _ = self.transport.react(&msg.chat, &msg.id, reactions::FAIL).await;
                remove_quietly(&out).await;
                Err(error.into())
            },
        }
    }

    /// Download the best audio for `url` as mp3 and upload it as a document.
    pub async fn audio(&self, msg: &InboundMessage, url: &str) -> anyhow::Result<()> {
        let _ = self.transport.react(&msg.chat, &msg.id, reactions::WAIT).await;
        let title = match self.source.probe(url).await {
            Ok(details) => details.title,
            Err(error) => {
                let _ = self.transport.react(&msg.chat, &msg.id, reactions::FAIL).await;
                return Err(error.into());
            },
        };
        let out = self.dir.join(format!("{}.mp3", sanitize_filename(&title)));
        match self.source.download_audio(url, &out).await {
            Ok(path) => self.upload(msg, path, true).await,
            Err(error) => {
                let _ = self.transport.react(&msg.chat, &msg.id, reactions::FAIL).await;
                remove_quietly(&out).await;
                Err(error.into())
            },
        }
    }

    /// Upload a downloaded file and clean it up, win or lose.
    async fn upload(
        &self,
        msg: &InboundMessage,
        mut path: PathBuf,
        force_document: bool,
    ) -> anyhow::Result<()> {
        let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);

        // Small videos get remuxed to mp4 so chats can inline-play them.
        // A failed remux falls back to the original file.
        if !force_document
            && size < self.remux_under
            && path.extension().and_then(|e| e.to_str()) != Some("mp4")
            && let Some(ffmpeg) = &self.ffmpeg
        {
            match ffmpeg.to_mp4(&path).await {
                Ok(converted) => path = converted,
                Err(error) => warn!(%error, "remux failed, sending original file"),
            }
        }

        let as_document = force_document || size > self.document_threshold;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".into());

        let _ = self.transport.react(&msg.chat, &msg.id, reactions::UPLOAD).await;
        let sent = self
            .transport
            .send_file(&msg.chat, &path, &filename, &self.caption, as_document)
            .await;
        remove_quietly(&path).await;

        match sent {
            Ok(_) => {
                let _ = self.transport.react(&msg.chat, &msg.id, reactions::DONE).await;
                Ok(())
            },
            Err(error) => {
                let _ = self.transport.react(&msg.chat, &msg.id, reactions::FAIL).await;
                Err(error)
            },
        }
    }
}
