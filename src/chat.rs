use chrono::{DateTime, Utc};
use serde::Serialize;

/// An in-call chat message
/// Kept in memory only; the log is dropped when the call ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of in-call chat messages for a single session
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; blank or whitespace-only input is rejected
    /// Returns whether the message was accepted
    pub fn push(&mut self, user_id: &str, user_name: &str, message: &str) -> bool {
        if message.trim().is_empty() {
            return false;
        }
        self.messages.push(ChatMessage {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        true
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

    /// Drop all messages (called when leaving a call)
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
