use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::chat::HealthResponse;
use crate::services::ConversationManager;

pub async fn health_check(State(manager): State<Arc<ConversationManager>>) -> Json<HealthResponse> {
    let stats = manager.health().await;

    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Chat memory server is running".to_string(),
        active_sessions: stats.active_sessions,
        total_messages: stats.total_messages,
        uptime_seconds: stats.uptime_seconds,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Service descriptor served at `/` when no frontend bundle is configured
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Chat Memory Server API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "health": "GET /api/health",
            "conversation": "GET|DELETE /api/conversation/{sessionId}",
            "sessions": "GET /api/sessions",
            "analytics": "GET /api/analytics[/{sessionId}]"
        }
    }))
}
