use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Role, SessionId};

/// A persisted message. Content is immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned, strictly increasing within a session.
    pub id: i64,
    pub session_id: SessionId,
    pub role: Role,
    pub content: String,
    /// Informational only; ordering always comes from `id`.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// `role: content`, the line format used in summarizer prompts.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Client-facing shape of a message. Ids travel as decimal strings so
/// 64-bit values survive text protocols without precision loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl From<&Message> for MessageView {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.to_string(),
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

impl From<Message> for MessageView {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id.to_string(),
            role: msg.role,
            content: msg.content,
        }
    }
}
