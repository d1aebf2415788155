//! Direct Facebook video download: normalize the share-link forms, then
//! let the download tool pick its "hd" stream.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, uuid::Uuid};

use {
    snagbot_channels::BotPlugin,
    snagbot_common::{bail_user, types::InboundMessage},
    snagbot_config::Config,
};

use crate::{delivery::Delivery, urls};

pub struct FacebookPlugin {
    delivery: Arc<Delivery>,
    prefix: String,
}

impl FacebookPlugin {
    pub fn new(delivery: Arc<Delivery>, config: &Config) -> Self {
        Self {
            delivery,
            prefix: config.bot.command_prefix.clone(),
        }
    }
}

#[async_trait]
impl BotPlugin for FacebookPlugin {
    fn name(&self) -> &str {
        "facebook"
    }

    fn commands(&self) -> &[&str] {
        &["fb", "facebook", "fbdl"]
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let Some(raw) = args.split_whitespace().next() else {
            bail_user!(
                "Please send the link of a Facebook video. Example: {}fb https://www.facebook.com/share/v/abc123",
                self.prefix
            );
        };
        let Some(url) = urls::normalize_facebook(raw) else {
            bail_user!("Please give a valid Facebook video URL.");
        };

        let name = format!("facebook_{}", Uuid::new_v4());
        self.delivery.video(msg, &url, "hd", &name, "mp4").await
    }
}
