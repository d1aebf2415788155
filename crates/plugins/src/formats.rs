//! List-formats workflow.
//!
//! `fmt <url>` asks the tool for every downloadable format of an arbitrary
//! video URL and presents them numbered; the next numeric reply from the
//! same sender dispatches the download with the picked format id.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::warn};

use {
    snagbot_channels::{BotPlugin, Transport},
    snagbot_common::{bail_user, types::InboundMessage, user_error},
    snagbot_config::Config,
    snagbot_media::{FormatInfo, MediaSource},
    snagbot_sessions::{
        CorrelationRule, Expired, Resolution, Session, SessionState, SessionStore,
    },
};

use crate::{delivery::Delivery, urls};

const FORMAT_INVALID: &str = "Invalid choice. Please reply with a valid number.";
const DOWNLOAD_FAILED: &str = "Error downloading the video. Try another quality.";
const LISTING_FAILED: &str = "Error fetching video formats. Try another URL.";

struct FormatPick {
    url: String,
    title: String,
    formats: Vec<FormatInfo>,
}

impl SessionState for FormatPick {
    fn option_count(&self) -> usize {
        self.formats.len()
    }
}

pub struct FormatsPlugin {
    transport: Arc<dyn Transport>,
    source: Arc<dyn MediaSource>,
    delivery: Arc<Delivery>,
    sessions: SessionStore<FormatPick>,
}

impl FormatsPlugin {
    pub fn new(
        transport: Arc<dyn Transport>,
        source: Arc<dyn MediaSource>,
        delivery: Arc<Delivery>,
        config: &Config,
    ) -> Self {
        let notifier = Arc::clone(&transport);
        let sessions = SessionStore::new("formats", config.session_timeout())
            .with_expiry_notice(Arc::new(move |expired: Expired<FormatPick>| {
                let transport = Arc::clone(&notifier);
                tokio::spawn(async move {
                    let _ = transport
                        .reply(&expired.session.chat, "Timeout! Please start over.")
                        .await;
                });
            }));
        Self {
            transport,
            source,
            delivery,
            sessions,
        }
    }

    fn render_formats(formats: &[FormatInfo]) -> String {
        let mut text = String::from("Available qualities:\n");
        for (i, format) in formats.iter().enumerate() {
            let size = format.size.as_deref().unwrap_or("unknown size");
            text.push_str(&format!(
                "\n{}. {} ({}) - {}",
                i + 1,
                format.resolution,
                format.id,
                size
            ));
        }
        text.push_str("\n\nReply with the number to select.");
        text
    }
}

#[async_trait]
impl BotPlugin for FormatsPlugin {
    fn name(&self) -> &str {
        "formats"
    }

    fn commands(&self) -> &[&str] {
        &["fmt", "formats"]
    }

    async fn before(&self, msg: &InboundMessage) -> Result<bool> {
        match self.sessions.resolve(msg).await {
            Resolution::NotMine => Ok(false),
            Resolution::Rejected { chat, .. } => {
                self.transport.reply(&chat, FORMAT_INVALID).await?;
                Ok(true)
            },
            Resolution::Picked { choice, session } => {
                let FormatPick {
                    url,
                    title,
                    formats,
                } = session.state;
                let format = &formats[choice];
                if let Err(error) = self
                    .delivery
                    .video(msg, &url, &format.id, &title, "mp4")
                    .await
                {
                    warn!(%error, %url, format = %format.id, "formats flow download failed");
                    self.transport.reply(&session.chat, DOWNLOAD_FAILED).await?;
                }
                Ok(true)
            },
        }
    }

    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let url = args.trim();
        if !urls::is_http_url(url) {
            bail_user!("Invalid URL format. Please provide a valid video URL.");
        }

        let formats = match self.source.list_formats(url).await {
            Ok(formats) => formats,
            Err(error) => {
                warn!(%error, url, "format listing failed");
                return Err(user_error(LISTING_FAILED));
            },
        };
        if formats.is_empty() {
            self.transport
                .reply(&msg.chat, "No formats available for this URL. Try another URL.")
                .await?;
            return Ok(());
        }
        let title = match self.source.probe(url).await {
            Ok(details) => details.title,
            Err(error) => {
                warn!(%error, url, "title probe failed");
                return Err(user_error(LISTING_FAILED));
            },
        };

        self.transport
            .reply(&msg.chat, &Self::render_formats(&formats))
            .await?;
        self.sessions
            .create(
                &msg.sender,
                Session::new(
                    msg.chat.clone(),
                    CorrelationRule::AnyReply,
                    FormatPick {
                        url: url.to_string(),
                        title,
                        formats,
                    },
                ),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use snagbot_common::UserError;

    use {
        super::*,
        crate::testing::{MockSource, MockTransport, msg, test_config},
    };

    fn formats() -> Vec<FormatInfo> {
        vec![
            FormatInfo {
                id: "18".into(),
                resolution: "640x360".into(),
                size: Some("8.79MiB".into()),
            },
            FormatInfo {
                id: "137".into(),
                resolution: "1920x1080".into(),
                size: None,
            },
        ]
    }

    fn setup(
        formats: Vec<FormatInfo>,
    ) -> (Arc<MockTransport>, Arc<MockSource>, FormatsPlugin, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let transport = Arc::new(MockTransport::default());
        let source = Arc::new(MockSource {
            formats,
            details: Some(MockSource::details("Clip")),
            ..Default::default()
        });
        let delivery = Arc::new(Delivery::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&source) as Arc<dyn MediaSource>,
            &config,
        ));
        let plugin = FormatsPlugin::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&source) as Arc<dyn MediaSource>,
            delivery,
            &config,
        );
        (transport, source, plugin, dir)
    }

    #[tokio::test]
    async fn listing_is_numbered_with_sizes() {
        let (transport, _source, plugin, _dir) = setup(formats());

        plugin
            .handle(&msg("alice", "!fmt x"), "https://example.com/v/1")
            .await
            .unwrap();
        let listing = transport.last_reply();
        assert!(listing.contains("1. 640x360 (18) - 8.79MiB"));
        assert!(listing.contains("2. 1920x1080 (137) - unknown size"));
    }

    #[tokio::test]
    async fn picking_a_format_downloads_by_id() {
        let (_transport, source, plugin, _dir) = setup(formats());

        plugin
            .handle(&msg("alice", "!fmt x"), "https://example.com/v/1")
            .await
            .unwrap();
        assert!(plugin.before(&msg("alice", "2")).await.unwrap());

        let downloads = source.video_downloads.lock().unwrap().clone();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].0, "https://example.com/v/1");
        assert_eq!(downloads[0].1, "137");

        assert!(!plugin.before(&msg("alice", "2")).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_pick_keeps_the_dynamic_option_set() {
        let (transport, source, plugin, _dir) = setup(formats());

        plugin
            .handle(&msg("alice", "!fmt x"), "https://example.com/v/1")
            .await
            .unwrap();
        assert!(plugin.before(&msg("alice", "3")).await.unwrap());
        assert_eq!(transport.last_reply(), FORMAT_INVALID);
        assert!(source.video_downloads.lock().unwrap().is_empty());

        assert!(plugin.before(&msg("alice", "1")).await.unwrap());
        assert_eq!(source.video_downloads.lock().unwrap()[0].1, "18");
    }

    #[tokio::test]
    async fn empty_listing_leaves_no_session() {
        let (transport, _source, plugin, _dir) = setup(Vec::new());

        plugin
            .handle(&msg("alice", "!fmt x"), "https://example.com/v/1")
            .await
            .unwrap();
        assert!(transport.last_reply().contains("No formats available"));
        assert!(!plugin.before(&msg("alice", "1")).await.unwrap());
    }

    #[tokio::test]
    async fn non_urls_are_user_errors() {
        let (_transport, _source, plugin, _dir) = setup(formats());
        let error = plugin
            .handle(&msg("alice", "!fmt x"), "not a url")
            .await
            .unwrap_err();
        assert!(error.downcast_ref::<UserError>().is_some());
    }
}
