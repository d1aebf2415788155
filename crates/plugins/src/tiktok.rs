//! Direct TikTok download via a watermark-free resolver API.

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    serde::Deserialize,
    uuid::Uuid,
};

use {
    snagbot_channels::{BotPlugin, Transport, reactions},
    snagbot_common::{bail_user, types::InboundMessage},
    snagbot_config::Config,
    snagbot_media::{fetch, files::remove_quietly},
};

#[derive(Deserialize)]
struct ResolverResponse {
    #[serde(default)]
    status: bool,
    result: Option<ResolverResult>,
}

#[derive(Deserialize)]
struct ResolverResult {
    no_wm: Option<String>,
}

pub struct TikTokPlugin {
    transport: Arc<dyn Transport>,
    client: reqwest::Client,
    api_base: String,
    dir: PathBuf,
    caption: String,
}

impl TikTokPlugin {
    pub fn new(transport: Arc<dyn Transport>, client: reqwest::Client, config: &Config) -> Self {
        Self {
            transport,
            client,
            api_base: config.tiktok.api_base.clone(),
            dir: config.downloads.dir.clone(),
            caption: config.bot.caption.clone(),
        }
    }

    async fn fetch_and_send(&self, msg: &InboundMessage, url: &str) -> Result<()> {
        let resolved: ResolverResponse = self
            .client
            .get(&self.api_base)
            .query(&[("url", url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let ok = resolved.status;
        let media_url = resolved
            .result
            .and_then(|r| r.no_wm)
            .filter(|_| ok)
            .context("resolver returned no media url")?;

        let out = self.dir.join(format!("tiktok_{}.mp4", Uuid::new_v4()));
        let path = fetch::download_to_file(&self.client, &media_url, &out).await?;
        let sent = self
            .transport
            .send_file(&msg.chat, &path, "tiktok.mp4", &self.caption, false)
            .await;
        remove_quietly(&path).await;
        sent.map(|_| ())
    }
}

#[async_trait]
impl BotPlugin for TikTokPlugin {
    fn name(&self) -> &str {
        "tiktok"
    }

    fn commands(&self) -> &[&str] {
        &["tiktok", "tt", "tikdown", "ttdl"]
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let url = args.trim();
        if url.is_empty() {
            bail_user!("Enter the TikTok link next to the command.");
        }

        let _ = self.transport.react(&msg.chat, &msg.id, reactions::WAIT).await;
        match self.fetch_and_send(msg, url).await {
            Ok(()) => {
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
