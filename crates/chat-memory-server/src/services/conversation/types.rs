use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque session identifier (client supplied or server generated)
pub type SessionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of a session log. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Likes,
    Dislikes,
}

/// Derived aggregate folded from the user messages of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Most recent topic matches, oldest first, bounded
    pub topics: Vec<String>,
    pub preferences: BTreeMap<PreferenceKind, String>,
    #[serde(rename = "conversationTone", skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<DateTime<Utc>>,
}

impl SessionContext {
    pub fn tone_or_neutral(&self) -> &str {
        self.tone.as_deref().unwrap_or("neutral")
    }
}

/// Per-session counters for analytics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationMetadata {
    pub completed_turns: usize,
    pub failed_turns: usize,
    /// Turns answered from the reduced fallback bundle
    pub reduced_context_turns: usize,
    pub total_response_ms: u64,
}

impl ConversationMetadata {
    pub fn average_response_ms(&self) -> u64 {
        if self.completed_turns == 0 {
            return 0;
        }
        self.total_response_ms / self.completed_turns as u64
    }
}

/// Complete conversation state kept by the session store
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub start_time: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    pub context: SessionContext,
    pub metadata: ConversationMetadata,
}

impl Session {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            start_time: Utc::now(),
            messages: Vec::new(),
            context: SessionContext::default(),
            metadata: ConversationMetadata::default(),
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    /// Latest of the last completed turn and the newest stored message
    pub fn last_activity(&self) -> DateTime<Utc> {
        let newest_message = self.messages.last().map(|m| m.timestamp);
        self.context
            .last_interaction
            .max(newest_message)
            .unwrap_or(self.start_time)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            message_count: self.message_count(),
            last_activity: self.last_activity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub message_count: usize,
    pub last_activity: DateTime<Utc>,
}

/// Prompt submitted for one completion call. Built per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle {
    pub system_prompt: String,
    pub windowed_messages: Vec<ChatMessage>,
}

/// Result of a successful chat turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub session_id: SessionId,
    pub message_count: usize,
    pub context: SessionContext,
    pub reduced_context: bool,
}
