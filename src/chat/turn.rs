//! Conversation data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sender {
    /// The person typing.
    User,
    /// An assistant answer.
    Ai,
    /// Assistant-side notice that is shown but never sent back as context.
    AiContext,
}

impl Sender {
    /// Whether turns from this sender are recorded in the session history.
    #[must_use]
    pub const fn is_recorded(self) -> bool {
        matches!(self, Self::User | Self::Ai)
    }

    /// Avatar letter shown next to the message.
    #[must_use]
    pub const fn avatar(self) -> char {
        match self {
            Self::User => 'T',
            Self::Ai | Self::AiContext => 'Q',
        }
    }
}

/// One message of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Raw message text (before formatting).
    pub text: String,
    /// Author of the message.
    pub sender: Sender,
    /// Creation time, serialized as ISO 8601.
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Project this turn to a context message, if its sender takes part in the context.
    #[must_use]
    pub fn to_context(&self) -> Option<ContextMessage> {
        let role = match self.sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Assistant,
            Sender::AiContext => return None,
        };
        Some(ContextMessage {
            role,
            content: self.text.clone(),
        })
    }
}

/// Role of a context message on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sent by the user.
    User,
    /// Sent by the assistant.
    Assistant,
}

/// A turn as sent to the chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    /// Wire role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// Which screen the chat is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Greeting screen with the main input.
    #[default]
    Welcome,
    /// Message list with the bottom input bar.
    Conversation,
}

/// Identifier of one chat session; a fresh one is issued on every new chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
