use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::{PreferenceKind, Role, Session, SessionId};

/// Per-session analytics (`GET /analytics/{sessionId}`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub session_id: SessionId,
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    /// Milliseconds since the session started
    pub session_duration: i64,
    pub topics: Vec<String>,
    pub preferences: BTreeMap<PreferenceKind, String>,
    pub conversation_tone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    pub completed_turns: usize,
    pub failed_turns: usize,
    pub reduced_context_turns: usize,
    pub average_response_ms: u64,
}

impl SessionAnalytics {
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id.clone(),
            total_messages: session.message_count(),
            user_messages: session.count_role(Role::User),
            bot_messages: session.count_role(Role::Assistant),
            session_duration: (now - session.start_time).num_milliseconds().max(0),
            topics: session.context.topics.clone(),
            preferences: session.context.preferences.clone(),
            conversation_tone: session.context.tone_or_neutral().to_string(),
            intent: session.context.intent.clone(),
            last_activity: session.context.last_interaction,
            completed_turns: session.metadata.completed_turns,
            failed_turns: session.metadata.failed_turns,
            reduced_context_turns: session.metadata.reduced_context_turns,
            average_response_ms: session.metadata.average_response_ms(),
        }
    }
}

/// Aggregate analytics over every live session (`GET /analytics`)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateAnalytics {
    pub active_sessions: usize,
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    pub uptime_seconds: u64,
    pub tone_distribution: BTreeMap<String, usize>,
    /// Topic label -> occurrences in the retained topic lists, most frequent first
    pub top_topics: Vec<TopicCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

impl AggregateAnalytics {
    pub fn accumulate(&mut self, session: &Session) {
        self.active_sessions += 1;
        self.total_messages += session.message_count();
        self.user_messages += session.count_role(Role::User);
        self.bot_messages += session.count_role(Role::Assistant);

        if let Some(tone) = &session.context.tone {
            *self.tone_distribution.entry(tone.clone()).or_insert(0) += 1;
        }

        for topic in &session.context.topics {
            match self.top_topics.iter_mut().find(|t| &t.topic == topic) {
                Some(entry) => entry.count += 1,
                None => self.top_topics.push(TopicCount {
                    topic: topic.clone(),
                    count: 1,
                }),
            }
        }
    }

    pub fn finish(mut self, uptime_seconds: u64) -> Self {
        self.uptime_seconds = uptime_seconds;
        self.top_topics
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
        self
    }
}

/// Liveness numbers for `GET /health`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStats {
    pub active_sessions: usize,
    pub total_messages: usize,
    pub uptime_seconds: u64,
}
