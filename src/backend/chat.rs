//! Triage assistant chat session

use super::dto::{ChatMessage, ChatRequest};
use super::TriageBackend;

/// Assistant reply used when the backend cannot be reached
pub const CHAT_FALLBACK_MESSAGE: &str =
    "I'm having trouble connecting to my brain right now. Please try again in a moment.";

/// Conversation with the triage assistant
///
/// Each request carries the conversation so far (excluding the new message).
/// A failed call appends the fallback reply instead of surfacing an error.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a message and return the assistant's reply. Blank input is ignored.
    pub async fn send(&mut self, backend: &dyn TriageBackend, message: &str) -> Option<&ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let request = ChatRequest {
            message: message.to_string(),
            history: self.messages.clone(),
        };
        self.messages.push(ChatMessage::user(message));

        let reply = match backend.chat(&request).await {
            Ok(response) => response.response,
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                CHAT_FALLBACK_MESSAGE.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(reply));
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
