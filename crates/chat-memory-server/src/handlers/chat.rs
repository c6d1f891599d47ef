use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::models::chat::{ChatRequest, ChatResponse};
use crate::services::ConversationManager;
use crate::utils::error::ApiError;

pub async fn chat_handler(
    State(manager): State<Arc<ConversationManager>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let start_time = Instant::now();

    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let message = request.message.unwrap_or_default();

    info!(
        "Chat request: session={}, message_len={}",
        request.session_id.as_deref().unwrap_or("<new>"),
        message.len()
    );

    let outcome = manager.handle_message(request.session_id, &message).await?;

    info!(
        "Chat completed in {}ms: session={}, messages={}",
        start_time.elapsed().as_millis(),
        outcome.session_id,
        outcome.message_count
    );

    Ok(Json(outcome.into()))
}
