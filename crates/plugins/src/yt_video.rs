//! Metadata-then-quality workflow.
//!
//! `ytv <url>` probes the video, posts a detail card with the thumbnail
//! attached, and parks an anchored session: only a reply quoting that card
//! picks a quality tier. The pick dispatches the download with the tier's
//! format selector.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::warn};

use {
    snagbot_channels::{BotPlugin, Transport},
    snagbot_common::{bail_user, types::InboundMessage, user_error},
    snagbot_config::Config,
    snagbot_media::{MediaSource, QUALITY_TIERS, VideoDetails, fetch},
    snagbot_sessions::{
        CorrelationRule, Expired, Resolution, Session, SessionState, SessionStore,
    },
};

use crate::{delivery::Delivery, urls};

const QUALITY_INVALID: &str = "Invalid choice. Please reply with 1, 2, 3, 4 or 5.";
const DOWNLOAD_FAILED: &str = "Error downloading the video. Try another URL or quality.";

struct QualityPick {
    url: String,
    title: String,
}

impl SessionState for QualityPick {
    fn option_count(&self) -> usize {
        QUALITY_TIERS.len()
    }
}

pub struct YtVideoPlugin {
    transport: Arc<dyn Transport>,
    source: Arc<dyn MediaSource>,
    delivery: Arc<Delivery>,
    client: reqwest::Client,
    sessions: SessionStore<QualityPick>,
    prefix: String,
}

impl YtVideoPlugin {
    pub fn new(
        transport: Arc<dyn Transport>,
        source: Arc<dyn MediaSource>,
        delivery: Arc<Delivery>,
        client: reqwest::Client,
        config: &Config,
    ) -> Self {
        let notifier = Arc::clone(&transport);
        let sessions = SessionStore::new("yt-video", config.session_timeout())
            .with_expiry_notice(Arc::new(move |expired: Expired<QualityPick>| {
                let transport = Arc::clone(&notifier);
                tokio::spawn(async move {
                    let _ = transport
                        .reply(&expired.session.chat, "Timeout! Please try again.")
                        .await;
                });
            }));
        Self {
            transport,
            source,
            delivery,
            client,
            sessions,
            prefix: config.bot.command_prefix.clone(),
        }
    }

    fn render_card(details: &VideoDetails) -> String {
        let mut text = format!("❏ TITLE : {}\n", details.title);
        if let Some(duration) = &details.duration {
            text.push_str(&format!("❏ DURATION : {duration}\n"));
        }
        if let Some(views) = details.views {
            text.push_str(&format!("❏ VIEWS : {views}\n"));
        }
        if let Some(channel) = &details.channel {
            text.push_str(&format!("❏ AUTHOR : {channel}\n"));
        }
        if let Some(published) = &details.published {
            text.push_str(&format!("❏ PUBLISHED : {published}\n"));
        }
        text.push_str(&format!("❏ URL : {}\n", details.url()));

        text.push_str("\nChoose a quality to download:\n");
        for (i, tier) in QUALITY_TIERS.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, tier.label));
        }
        text.push_str("\nReply to this message with the number (1-5).");
        text
    }
}

#[async_trait]
impl BotPlugin for YtVideoPlugin {
    fn name(&self) -> &str {
        "yt-video"
    }

    fn commands(&self) -> &[&str] {
        &["ytv", "ytmp4"]
    }

    async fn before(&self, msg: &InboundMessage) -> Result<bool> {
        match self.sessions.resolve(msg).await {
            Resolution::NotMine => Ok(false),
            Resolution::Rejected { chat, .. } => {
                self.transport.reply(&chat, QUALITY_INVALID).await?;
                Ok(true)
            },
            Resolution::Picked { choice, session } => {
                let tier = &QUALITY_TIERS[choice];
                let QualityPick { url, title } = session.state;
                if let Err(error) = self
                    .delivery
                    .video(msg, &url, tier.selector, &title, "mkv")
                    .await
                {
                    warn!(%error, %url, tier = tier.label, "quality flow download failed");
                    self.transport.reply(&session.chat, DOWNLOAD_FAILED).await?;
                }
                Ok(true)
            },
        }
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let Some(raw) = args.split_whitespace().next() else {
            bail_user!(
                "Please provide a YouTube URL. Example: {}ytv https://youtu.be/example",
                self.prefix
            );
        };
        let Some(url) = urls::normalize_youtube(raw) else {
            bail_user!("Invalid YouTube URL.");
        };

        let details = match self.source.probe(&url).await {
            Ok(details) => details,
            Err(error) => {
                warn!(%error, %url, "probe failed");
                return Err(user_error(
                    "Couldn't fetch video details. Please check the URL.",
                ));
            },
        };

        let card = Self::render_card(&details);
        // The card message is the anchor; prefer it with the thumbnail
        // attached, but a failed thumbnail fetch must not kill the flow.
        let anchor = match &details.thumbnail {
            Some(thumb) => match fetch::fetch_bytes(&self.client, thumb).await {
                Ok(bytes) => self.transport.send_photo(&msg.chat, &bytes, &card).await?,
                Err(error) => {
                    warn!(%error, "thumbnail fetch failed, sending text card");
                    self.transport.reply(&msg.chat, &card).await?
                },
            },
            None => self.transport.reply(&msg.chat, &card).await?,
        };

        self.sessions
            .create(
                &msg.sender,
                Session::new(
                    msg.chat.clone(),
                    CorrelationRule::anchored(&anchor),
                    QualityPick {
                        url,
                        title: details.title,
                    },
                ),
            )
            .await;
        Ok(())
    }
}
