use std::sync::Arc;

use tracing::{debug, warn};

use snagbot_common::{UserError, types::InboundMessage};

use crate::{plugin::BotPlugin, transport::Transport};

/// Reply sent when a plugin fails with an error that is not user-facing.
pub const GENERIC_FAILURE: &str =
    "An error occurred while processing the request. Please try again later.";

/// Ordered registry of plugins plus the dispatch loop.
///
/// Dispatch is two-phase: every plugin's `before` hook sees the message
/// first (pending-session resolution), then the message is matched against
/// prefixed commands. Plugin errors become replies, never panics.
pub struct PluginRegistry {
    transport: Arc<dyn Transport>,
    plugins: Vec<Arc<dyn BotPlugin>>,
}

impl PluginRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Arc<dyn BotPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn list(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Route one inbound message through the before-hooks and then, if no
    /// hook consumed it, through prefixed command dispatch.
    pub async fn dispatch(&self, prefix: &str, msg: &InboundMessage) {
        for plugin in &self.plugins {
            match plugin.before(msg).await {
                Ok(false) => {},
                Ok(true) => {
                    debug!(plugin = plugin.name(), sender = %msg.sender, "message consumed by session");
                    return;
                },
                Err(error) => {
                    warn!(plugin = plugin.name(), %error, "before-hook failed");
                    self.report(&msg.chat, &error).await;
                    return;
                },
            }
        }

        let Some(rest) = msg.text.trim().strip_prefix(prefix) else {
            return;
        };
        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };
        if word.is_empty() {
            return;
        }

        let Some(plugin) = self
            .plugins
            .iter()
            .find(|p| p.commands().iter().any(|c| c.eq_ignore_ascii_case(word)))
        else {
            debug!(command = word, "no plugin for command");
            return;
        };

        debug!(plugin = plugin.name(), command = word, sender = %msg.sender, "dispatching command");
        if let Err(error) = plugin.handle(msg, args).await {
            warn!(plugin = plugin.name(), command = word, %error, "command failed");
            self.report(&msg.chat, &error).await;
        }
    }

    async fn report(&self, chat: &str, error: &anyhow::Error) {
        let text = match error.downcast_ref::<UserError>() {
            Some(user) => user.to_string(),
            None => GENERIC_FAILURE.to_string(),
        };
        if let Err(error) = self.transport.reply(chat, &text).await {
            warn!(%error, "failed to deliver error reply");
        }
    }
}
