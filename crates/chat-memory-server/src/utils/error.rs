use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::conversation::{ChatError, CompletionError};

pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "The AI service quota has been exceeded. Please check the account plan and billing details.";
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "The AI service rejected the configured API key. Please check the server configuration.";
pub const UNAVAILABLE_MESSAGE: &str = "Failed to get response from the AI service";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::BadRequest(msg),
            ChatError::NotFound(_) => ApiError::NotFound("Session not found".to_string()),
            ChatError::Completion(CompletionError::QuotaExceeded(msg)) => ApiError::QuotaExceeded(msg),
            ChatError::Completion(CompletionError::InvalidCredential(msg)) => {
                ApiError::InvalidCredential(msg)
            }
            ChatError::Completion(e) => ApiError::LlmError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Upstream detail is logged, never returned to the client
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::QuotaExceeded(msg) => {
                tracing::error!("Quota exceeded: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, QUOTA_EXCEEDED_MESSAGE.to_string())
            }
            ApiError::InvalidCredential(msg) => {
                tracing::error!("Invalid credential: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INVALID_CREDENTIAL_MESSAGE.to_string())
            }
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE_MESSAGE.to_string())
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_errors_map_to_distinct_api_errors() {
        assert!(matches!(
            ApiError::from(ChatError::Validation("Message is required".into())),
            ApiError::BadRequest(m) if m == "Message is required"
        ));
        assert!(matches!(
            ApiError::from(ChatError::NotFound("abc".into())),
            ApiError::NotFound(m) if m == "Session not found"
        ));
        assert!(matches!(
            ApiError::from(ChatError::Completion(CompletionError::QuotaExceeded("x".into()))),
            ApiError::QuotaExceeded(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::Completion(CompletionError::InvalidCredential("x".into()))),
            ApiError::InvalidCredential(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::Completion(CompletionError::ContextTooLong("x".into()))),
            ApiError::LlmError(_)
        ));
    }

    #[test]
    fn test_statuses() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::QuotaExceeded("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
