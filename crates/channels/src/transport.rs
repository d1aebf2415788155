use std::path::Path;

use {anyhow::Result, async_trait::async_trait};

use snagbot_common::types::MessageRef;

/// Reaction emojis used by the download plugins.
pub mod reactions {
    pub const WAIT: &str = "⏳";
    pub const UPLOAD: &str = "📤";
    pub const DONE: &str = "✅";
    pub const FAIL: &str = "❌";
}

/// Send operations a chat backend must provide.
///
/// Every send returns a [`MessageRef`] so callers can anchor follow-up
/// sessions on the message the options were presented in.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text to a chat.
    async fn reply(&self, chat: &str, text: &str) -> Result<MessageRef>;

    /// Send a local file with a caption. `as_document` asks the backend to
    /// skip its own transcoding/compression.
    async fn send_file(
        &self,
        chat: &str,
        file: &Path,
        filename: &str,
        caption: &str,
        as_document: bool,
    ) -> Result<MessageRef>;

    /// Send an in-memory image with a caption.
    async fn send_photo(&self, chat: &str, image: &[u8], caption: &str) -> Result<MessageRef>;

    /// React to a message with an emoji. Best effort; failures are ignored
    /// by callers.
    async fn react(&self, chat: &str, message_id: &str, emoji: &str) -> Result<()>;
}
