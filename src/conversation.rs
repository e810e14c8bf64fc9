//! In-memory conversation store: the ordered transcript and the pending gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::client::ReplyOutcome;

/// Opaque identifier assigned to a message when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        MessageId(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who wrote a message. Serializes to the wire role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// A single entry of the transcript
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(author: Author, content: String) -> Self {
        Self {
            id: MessageId::new(),
            author,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}

/// One prior turn as it is sent to the recommendation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Author,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.author,
            content: message.content.clone(),
        }
    }
}

/// Everything the client needs to issue the request for an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The submitted text with surrounding whitespace removed, identical to
    /// the stored user message. Untrimmed drafts are never sent.
    pub query: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("no request is awaiting a reply")]
    NoPendingTurn,
}

/// Ordered transcript seeded with the assistant greeting.
///
/// `messages[0]` is always the greeting and is never part of the history sent
/// to the service. At most one turn is awaiting a reply at any time.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
}

impl Conversation {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Author::Assistant, greeting.into())],
            pending: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Transcript without the greeting, in insertion order
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages.iter().skip(1).map(HistoryEntry::from).collect()
    }

    /// Accept a user submission.
    ///
    /// Returns `None` and leaves the conversation untouched when the trimmed
    /// text is empty or a reply is still outstanding. Otherwise appends the
    /// user message, marks the conversation pending and returns the turn the
    /// caller must send exactly once.
    pub fn submit_user_message(&mut self, text: &str) -> Option<Turn> {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return None;
        }

        let history = self.history();
        self.messages.push(Message::new(Author::User, text.to_string()));
        self.pending = true;

        Some(Turn {
            query: text.to_string(),
            history,
        })
    }

    /// Append the assistant reply for the outstanding turn and clear the gate
    pub fn receive_reply(&mut self, outcome: ReplyOutcome) -> Result<&Message, ConversationError> {
        if !self.pending {
            return Err(ConversationError::NoPendingTurn);
        }

        self.messages.push(Message::new(Author::Assistant, outcome.into_content()));
        self.pending = false;

        Ok(&self.messages[self.messages.len() - 1])
    }
}
