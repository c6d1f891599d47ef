use tracing::{error, info, warn};

use super::types::{ActivityLog, ActivityStatus};

/// Emits session activity as structured tracing events (target `activity`)
#[derive(Clone, Default)]
pub struct ActivityLogger;

impl ActivityLogger {
    pub fn new() -> Self {
        Self
    }

    /// Log activity (non-blocking, fire-and-forget)
    pub fn log(&self, activity: ActivityLog) {
        let ActivityLog {
            session_id,
            activity_type,
            activity_status,
            message_count,
            message_len,
            processing_time_ms,
            error_message,
            error_type,
            created_at,
        } = activity;

        let created_at = created_at.to_rfc3339();
        match activity_status {
            ActivityStatus::Error => error!(
                target: "activity",
                session_id = %session_id,
                activity = activity_type.as_str(),
                status = activity_status.as_str(),
                message_count,
                processing_time_ms,
                error_type = error_type.as_deref().unwrap_or("unknown"),
                error_message = error_message.as_deref().unwrap_or(""),
                created_at = %created_at,
            ),
            ActivityStatus::Warning => warn!(
                target: "activity",
                session_id = %session_id,
                activity = activity_type.as_str(),
                status = activity_status.as_str(),
                message_count,
                message_len,
                created_at = %created_at,
            ),
            ActivityStatus::Success | ActivityStatus::Info => info!(
                target: "activity",
                session_id = %session_id,
                activity = activity_type.as_str(),
                status = activity_status.as_str(),
                message_count,
                message_len,
                processing_time_ms,
                created_at = %created_at,
            ),
        }
    }
}
