use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::conversation::{
    ChatMessage, Session, SessionContext, SessionSummary, TurnOutcome,
};

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub message_count: usize,
    pub context: SessionContext,
    /// Present only when the turn was answered from the reduced fallback prompt
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reduced_context: bool,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            response: outcome.response,
            session_id: outcome.session_id,
            message_count: outcome.message_count,
            context: outcome.context,
            reduced_context: outcome.reduced_context,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    pub context: SessionContext,
    pub message_count: usize,
}

impl From<Session> for ConversationResponse {
    fn from(session: Session) -> Self {
        Self {
            message_count: session.message_count(),
            session_id: session.id,
            start_time: session.start_time,
            messages: session.messages,
            context: session.context,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub active_sessions: usize,
    pub total_messages: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
