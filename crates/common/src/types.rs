//! Message types exchanged between the transport and the plugins.

/// An inbound chat message as seen by plugins.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Conversation the message arrived in.
    pub chat: String,
    /// Stable sender identity. Pending sessions are keyed by this.
    pub sender: String,
    /// Message body. Empty for non-text messages.
    pub text: String,
    /// Transport-assigned message id.
    pub id: String,
    /// Id of the message this one quotes, if any.
    pub quoted_id: Option<String>,
}

impl InboundMessage {
    /// Convenience constructor for plain (non-quoting) text messages.
    pub fn text(chat: impl Into<String>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            sender: sender.into(),
            text: text.into(),
            id: String::new(),
            quoted_id: None,
        }
    }
}

/// Reference to a message the bot sent, usable as a reply anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
}

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
