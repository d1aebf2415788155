//! Console transport for local runs: outbound messages print to stdout,
//! inbound messages are read line by line from stdin. A line of the form
//! `@bot-3 2` is treated as a reply quoting message `bot-3`, which is how
//! anchored sessions are exercised from a terminal.

use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use {anyhow::Result, async_trait::async_trait};

use {
    snagbot_channels::Transport,
    snagbot_common::types::{InboundMessage, MessageRef},
};

#[derive(Default)]
pub struct ConsoleTransport {
    next_id: AtomicU64,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_ref(&self) -> MessageRef {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        MessageRef::new(format!("bot-{n}"))
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn reply(&self, chat: &str, text: &str) -> Result<MessageRef> {
        let message = self.next_ref();
        println!("[{chat}] ({}) {text}", message.id);
        Ok(message)
    }

    async fn send_file(
        &self,
        chat: &str,
        file: &Path,
        filename: &str,
        _caption: &str,
        as_document: bool,
    ) -> Result<MessageRef> {
        let message = self.next_ref();
        let kind = if as_document { "document" } else { "file" };
        println!(
            "[{chat}] ({}) {kind}: {filename} <- {}",
            message.id,
            file.display()
        );
        Ok(message)
    }

    async fn send_photo(&self, chat: &str, image: &[u8], caption: &str) -> Result<MessageRef> {
        let message = self.next_ref();
        println!(
            "[{chat}] ({}) photo ({} bytes)\n{caption}",
            message.id,
            image.len()
        );
        Ok(message)
    }

    async fn react(&self, chat: &str, message_id: &str, emoji: &str) -> Result<()> {
        println!("[{chat}] {emoji} (on {message_id})");
        Ok(())
    }
}

/// Parse one stdin line into an inbound message.
pub fn parse_line(chat: &str, sender: &str, id: &str, line: &str) -> InboundMessage {
    let line = line.trim();
    let (quoted_id, text) = match line.strip_prefix('@') {
        Some(rest) => match rest.split_once(char::is_whitespace) {
            Some((quoted, text)) => (Some(quoted.to_string()), text.trim()),
            None => (None, line),
        },
        None => (None, line),
    };
    InboundMessage {
        chat: chat.into(),
        sender: sender.into(),
        text: text.into(),
        id: id.into(),
        quoted_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_plain_messages() {
        let msg = parse_line("console", "local", "in-1", "!yts funny cats");
        assert_eq!(msg.text, "!yts funny cats");
        assert_eq!(msg.quoted_id, None);
    }

    #[test]
    fn at_prefixed_lines_quote_a_message() {
        let msg = parse_line("console", "local", "in-2", "@bot-3 2");
        assert_eq!(msg.quoted_id.as_deref(), Some("bot-3"));
        assert_eq!(msg.text, "2");
    }

    #[test]
    fn bare_at_token_is_kept_as_text() {
        let msg = parse_line("console", "local", "in-3", "@bot-3");
        assert_eq!(msg.quoted_id, None);
        assert_eq!(msg.text, "@bot-3");
    }
}
