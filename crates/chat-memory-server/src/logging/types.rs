use chrono::{DateTime, Utc};
use serde::Serialize;

/// Activity type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    SessionCreated,
    RequestReceived,
    TurnCompleted,
    ContextReduced,
    CompletionFailed,
    LogTrimmed,
    SessionCleared,
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SessionCreated => "session_created",
            Self::RequestReceived => "request_received",
            Self::TurnCompleted => "turn_completed",
            Self::ContextReduced => "context_reduced",
            Self::CompletionFailed => "completion_failed",
            Self::LogTrimmed => "log_trimmed",
            Self::SessionCleared => "session_cleared",
        }
    }
}

/// Activity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Error,
    Warning,
    Info,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// One session activity entry
#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub session_id: String,
    pub activity_type: ActivityType,
    pub activity_status: ActivityStatus,

    pub message_count: Option<usize>,
    pub message_len: Option<usize>,
    pub processing_time_ms: Option<u64>,

    pub error_message: Option<String>,
    pub error_type: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn builder(session_id: &str, activity_type: ActivityType) -> ActivityLogBuilder {
        ActivityLogBuilder::new(session_id, activity_type)
    }
}

/// Builder pattern for ActivityLog
pub struct ActivityLogBuilder {
    log: ActivityLog,
}

impl ActivityLogBuilder {
    pub fn new(session_id: &str, activity_type: ActivityType) -> Self {
        Self {
            log: ActivityLog {
                session_id: session_id.to_string(),
                activity_type,
                activity_status: ActivityStatus::Success,
                message_count: None,
                message_len: None,
                processing_time_ms: None,
                error_message: None,
                error_type: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn status(mut self, status: ActivityStatus) -> Self {
        self.log.activity_status = status;
        self
    }

    pub fn message_count(mut self, count: usize) -> Self {
        self.log.message_count = Some(count);
        self
    }

    /// Only the length is recorded, never the user's text
    pub fn message_len(mut self, len: usize) -> Self {
        self.log.message_len = Some(len);
        self
    }

    pub fn processing_time(mut self, ms: u64) -> Self {
        self.log.processing_time_ms = Some(ms);
        self
    }

    pub fn error(mut self, message: impl Into<String>, error_type: impl Into<String>) -> Self {
        self.log.error_message = Some(message.into());
        self.log.error_type = Some(error_type.into());
        self.log.activity_status = ActivityStatus::Error;
        self
    }

    pub fn build(self) -> ActivityLog {
        self.log
    }
}
