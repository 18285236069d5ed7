//! Conversation log shown in the chat pane.

use std::fmt;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Map a wire sender name (`"You"`, `"user"`, `"Bot"`, ...).
    ///
    /// Returns `None` for names that are neither side of the conversation.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "user" | "you" => Some(Sender::User),
            "bot" | "assistant" => Some(Sender::Bot),
            _ => None,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Bot => f.write_str("bot"),
        }
    }
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    sender: Sender,
    text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered, append-only message list plus the "bot is responding" flag.
///
/// The only non-append mutation is [`ConversationLog::replace_all`], which
/// swaps the whole sequence at once.
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append_local(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::user(text))
    }

    pub fn append_remote(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::bot(text))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Replace the whole history with the authoritative remote copy.
    pub fn replace_all(&mut self, entries: Vec<ChatMessage>) {
        self.messages = entries;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    /// Clear the pending flag. Returns whether it was set.
    pub fn clear_pending(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }
}
