use {anyhow::Result, async_trait::async_trait};

use snagbot_common::types::InboundMessage;

/// A bot command plugin.
///
/// Plugins get two entry points: `handle` for their own prefixed commands,
/// and `before`, which is offered every inbound message ahead of command
/// dispatch so a plugin can resolve one of its pending sessions.
#[async_trait]
pub trait BotPlugin: Send + Sync {
    /// Plugin identifier for logs.
    fn name(&self) -> &str;

    /// Command words (without prefix) this plugin handles.
    fn commands(&self) -> &[&str];

    /// Offered every inbound message before command dispatch, in
    /// registration order. Return `true` when the message resolved (or was
    /// rejected by) a pending session and is consumed.
    async fn before(&self, _msg: &InboundMessage) -> Result<bool> {
        Ok(false)
    }

    /// Command entry point. `args` is the text after the command word.
    async fn handle(&self, msg: &InboundMessage, args: &str) -> Result<()>;
}
