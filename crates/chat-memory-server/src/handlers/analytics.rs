use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::services::conversation::{AggregateAnalytics, SessionAnalytics};
use crate::services::ConversationManager;
use crate::utils::error::ApiError;

pub async fn analytics_handler(
    State(manager): State<Arc<ConversationManager>>,
) -> Json<AggregateAnalytics> {
    Json(manager.analytics().await)
}

pub async fn session_analytics_handler(
    State(manager): State<Arc<ConversationManager>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionAnalytics>, ApiError> {
    Ok(Json(manager.session_analytics(&session_id).await?))
}
