//! Decides which inbound messages are eligible to resolve a session.
//!
//! The store has already matched the sender; the rule adds the per-workflow
//! constraint on top. Some workflows accept any text reply from the sender,
//! others require the reply to quote the exact message the options were
//! presented in.

use snagbot_common::types::{InboundMessage, MessageRef};

/// Per-session correlation predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationRule {
    /// Any text message from the session's sender resolves the prompt.
    AnyReply,
    /// Only a text reply quoting the given message resolves the prompt.
    QuoteOf(String),
}

impl CorrelationRule {
    /// Rule requiring a quote of the message the options were sent in.
    #[must_use]
    pub fn anchored(anchor: &MessageRef) -> Self {
        Self::QuoteOf(anchor.id.clone())
    }

    /// Whether `msg` is eligible to resolve a session under this rule.
    ///
    /// Messages without text never match; they are not selections.
    #[must_use]
    pub fn matches(&self, msg: &InboundMessage) -> bool {
        if msg.text.trim().is_empty() {
            return false;
        }
        match self {
            Self::AnyReply => true,
            Self::QuoteOf(id) => msg.quoted_id.as_deref() == Some(id.as_str()),
        }
    }
}
