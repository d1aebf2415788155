//! Search-and-select workflow.
//!
//! `yts <query>` presents a numbered result list. The next numeric reply
//! from the same sender picks a result, a second prompt offers video or
//! audio, and the second pick dispatches the matching download.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::warn};

use {
    snagbot_channels::{BotPlugin, Transport},
    snagbot_common::{bail_user, types::InboundMessage, user_error},
    snagbot_config::Config,
    snagbot_media::{DEFAULT_VIDEO_SELECTOR, MediaSource, VideoHit},
    snagbot_sessions::{
        CorrelationRule, Expired, Resolution, Session, SessionState, SessionStore,
    },
};

use crate::delivery::Delivery;

const KIND_PROMPT: &str =
    "Choose a format to download:\n1. Video\n2. Audio\n\nReply with the number (1 or 2).";
const RESULT_INVALID: &str = "Invalid choice. Please select a valid number from the list.";
const KIND_INVALID: &str = "Invalid choice. Reply with 1 for video or 2 for audio.";
const DOWNLOAD_FAILED: &str = "Error downloading the video. Please try again with a new search.";

enum SearchFlow {
    /// Search hits awaiting a pick.
    PickResult { hits: Vec<VideoHit> },
    /// Video-or-audio choice for the picked result.
    PickKind { url: String, title: String },
}

impl SessionState for SearchFlow {
    fn option_count(&self) -> usize {
        match self {
            Self::PickResult { hits } => hits.len(),
            Self::PickKind { .. } => 2,
        }
    }
}

pub struct YtSearchPlugin {
    transport: Arc<dyn Transport>,
    source: Arc<dyn MediaSource>,
    delivery: Arc<Delivery>,
    sessions: SessionStore<SearchFlow>,
    prefix: String,
    search_limit: usize,
}

impl YtSearchPlugin {
    pub fn new(
        transport: Arc<dyn Transport>,
        source: Arc<dyn MediaSource>,
        delivery: Arc<Delivery>,
        config: &Config,
    ) -> Self {
        let notifier = Arc::clone(&transport);
        let sessions = SessionStore::new("yt-search", config.session_timeout())
            .with_expiry_notice(Arc::new(move |expired: Expired<SearchFlow>| {
                let transport = Arc::clone(&notifier);
                tokio::spawn(async move {
                    let text = match expired.session.state {
                        SearchFlow::PickResult { .. } => {
                            "Search session expired. Please try again."
                        },
                        SearchFlow::PickKind { .. } => {
                            "Download session expired. Please try again."
                        },
                    };
                    let _ = transport.reply(&expired.session.chat, text).await;
                });
            }));
        Self {
            transport,
            source,
            delivery,
            sessions,
            prefix: config.bot.command_prefix.clone(),
            search_limit: config.ytdlp.search_limit,
        }
    }

    fn render_results(query: &str, hits: &[VideoHit]) -> String {
        let mut text = format!("🔍 Search results for \"{query}\":\n");
        for (i, hit) in hits.iter().enumerate() {
            let duration = hit.duration.as_deref().unwrap_or("?");
            text.push_str(&format!(
                "\n{}. {} ({})\n🔗 {}\n",
                i + 1,
                hit.title,
                duration,
                hit.url()
            ));
        }
        text.push_str("\nReply with the number of the video you want to download.");
        text
    }
}

#[async_trait]
impl BotPlugin for YtSearchPlugin {
    fn name(&self) -> &str {
        "yt-search"
    }

    fn commands(&self) -> &[&str] {
        &["yts"]
    }

    async fn before(&self, msg: &InboundMessage) -> Result<bool> {
        match self.sessions.resolve(msg).await {
            Resolution::NotMine => Ok(false),
            Resolution::Rejected { chat, .. } => {
                let text = self
                    .sessions
                    .peek(&msg.sender, |s| match &s.state {
                        SearchFlow::PickResult { .. } => RESULT_INVALID,
                        SearchFlow::PickKind { .. } => KIND_INVALID,
                    })
                    .await
                    .unwrap_or(RESULT_INVALID);
                self.transport.reply(&chat, text).await?;
                Ok(true)
            },
            Resolution::Picked { choice, session } => {
                match session.state {
                    SearchFlow::PickResult { hits } => {
                        let hit = &hits[choice];
                        self.transport.reply(&session.chat, KIND_PROMPT).await?;
                        self.sessions
                            .create(
                                &msg.sender,
                                Session::new(
                                    session.chat,
                                    CorrelationRule::AnyReply,
                                    SearchFlow::PickKind {
                                        url: hit.url(),
                                        title: hit.title.clone(),
                                    },
                                ),
                            )
                            .await;
                    },
                    SearchFlow::PickKind { url, title } => {
                        let result = if choice == 0 {
                            self.delivery
                                .video(msg, &url, DEFAULT_VIDEO_SELECTOR, &title, "mkv")
                                .await
                        } else {
                            self.delivery.audio(msg, &url).await
                        };
                        if let Err(error) = result {
                            warn!(%error, %url, "search flow download failed");
                            self.transport.reply(&session.chat, DOWNLOAD_FAILED).await?;
                        }
                    },
                }
                Ok(true)
            },
        }
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let query = args.trim();
        if query.is_empty() {
            bail_user!(
                "Please provide a search query. Example: {}yts funny cat videos",
                self.prefix
            );
        }

        let hits = match self.source.search(query, self.search_limit).await {
            Ok(hits) => hits,
            Err(error) => {
                warn!(%error, query, "search failed");
                return Err(user_error(
                    "An error occurred while searching. Please try again later.",
                ));
            },
        };
        if hits.is_empty() {
            self.transport
                .reply(&msg.chat, &format!("No results found for \"{query}\"."))
                .await?;
            return Ok(());
        }

        self.transport
            .reply(&msg.chat, &Self::render_results(query, &hits))
            .await?;
        self.sessions
            .create(
                &msg.sender,
                Session::new(
                    msg.chat.clone(),
                    CorrelationRule::AnyReply,
                    SearchFlow::PickResult { hits },
                ),
            )
            .await;
        Ok(())
    }
}
