//! Direct audio download: `yta <url>` fetches the best audio as mp3 and
//! uploads it as a document. Also the bound action behind the search
//! flow's "audio" pick.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait};

use {
    snagbot_channels::BotPlugin,
    snagbot_common::{bail_user, types::InboundMessage},
    snagbot_config::Config,
};

use crate::{delivery::Delivery, urls};

pub struct YtAudioPlugin {
    delivery: Arc<Delivery>,
    prefix: String,
}

impl YtAudioPlugin {
    pub fn new(delivery: Arc<Delivery>, config: &Config) -> Self {
        Self {
            delivery,
            prefix: config.bot.command_prefix.clone(),
        }
    }
}

#[async_trait]
impl BotPlugin for YtAudioPlugin {
    fn name(&self) -> &str {
        "yt-audio"
    }

    fn commands(&self) -> &[&str] {
        &["yta", "ytmp3"]
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let Some(raw) = args.split_whitespace().next() else {
            bail_user!(
                "Please provide a YouTube URL. Example: {}yta https://youtu.be/example",
                self.prefix
            );
        };
        let Some(url) = urls::normalize_youtube(raw) else {
            bail_user!("Invalid YouTube URL. Please provide a valid URL.");
        };
        self.delivery.audio(msg, &url).await
    }
}
