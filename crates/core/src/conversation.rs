use serde::{Deserialize, Serialize};

use crate::domain::vehicle::VehicleId;

pub const DEFAULT_HISTORY_WINDOW: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Append-only transcript of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// The trailing `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
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
}

/// Per-user state carried between turns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub history: ConversationHistory,
    last_listing: Vec<VehicleId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers the ids shown to the user, in their displayed order.
    pub fn record_listing(&mut self, ids: Vec<VehicleId>) {
        self.last_listing = ids;
    }

    pub fn last_listing(&self) -> &[VehicleId] {
        &self.last_listing
    }

    /// Resolves a 1-based item number against the last listing.
    pub fn listing_entry(&self, item_number: u32) -> Option<VehicleId> {
        let index = usize::try_from(item_number).ok()?.checked_sub(1)?;
        self.last_listing.get(index).copied()
    }
}
