use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::chat::{ConversationResponse, MessageResponse, SessionsResponse};
use crate::services::ConversationManager;
use crate::utils::error::ApiError;

pub async fn get_conversation_handler(
    State(manager): State<Arc<ConversationManager>>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let session = manager.get_conversation(&session_id).await?;
    Ok(Json(session.into()))
}

pub async fn clear_conversation_handler(
    State(manager): State<Arc<ConversationManager>>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager.clear_conversation(&session_id).await?;
    info!("Conversation {} cleared", session_id);

    Ok(Json(MessageResponse {
        message: "Conversation cleared successfully".to_string(),
    }))
}

pub async fn list_sessions_handler(
    State(manager): State<Arc<ConversationManager>>,
) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: manager.list_sessions().await,
    })
}
