pub mod analytics;
pub mod chat;
pub mod conversation;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::path::Path;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::security::OriginAllowlist;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Every API route is served both at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let api_routes = Router::new()
        .route("/chat", post(chat::chat_handler))
        .route("/health", get(health::health_check))
        .route(
            "/conversation/{session_id}",
            get(conversation::get_conversation_handler)
                .delete(conversation::clear_conversation_handler),
        )
        .route("/sessions", get(conversation::list_sessions_handler))
        .route("/analytics", get(analytics::analytics_handler))
        .route(
            "/analytics/{session_id}",
            get(analytics::session_analytics_handler),
        );

    let mut router = Router::new()
        .merge(api_routes.clone())
        .nest("/api", api_routes);

    // Frontend bundle when configured, otherwise a JSON descriptor at `/`
    router = match settings.server.static_dir.as_deref() {
        Some(dir) => {
            info!("Serving static files from {}", dir);
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router.route("/", get(health::service_info)),
    };

    let allowlist = OriginAllowlist::new(&settings.cors.allowed_origins);

    router
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(allowlist.cors_layer(&settings.cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(DefaultBodyLimit::max(settings.server.body_limit_bytes))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::InternalError(format!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::services::conversation::gateway::MockCompletionProvider;
    use crate::services::conversation::CompletionError;
    use crate::services::ConversationManager;
    use crate::utils::error::QUOTA_EXCEEDED_MESSAGE;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router_with(mock: MockCompletionProvider) -> Router {
        let settings = Settings::default();
        let manager = Arc::new(ConversationManager::from_settings(&settings, Arc::new(mock)));
        build_router(AppState::new(manager, settings))
    }

    fn canned_provider(reply: &'static str) -> MockCompletionProvider {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(move |_, _, _| Ok(reply.to_string()));
        mock
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_chat_round_trip_and_conversation_fetch() {
        let router = router_with(canned_provider("Hi there, how can I help?"));

        let (status, body) = send(&router, Method::POST, "/chat", Some(json!({ "message": "Hello!" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hi there, how can I help?");
        assert_eq!(body["messageCount"], 2);
        assert_eq!(body["context"]["conversationTone"], "excited");
        assert_eq!(body["context"]["intent"], "greeting");
        assert!(body.get("reducedContext").is_none());

        let session_id = body["sessionId"].as_str().unwrap().to_string();
        let (status, conversation) =
            send(&router, Method::GET, &format!("/api/conversation/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(conversation["messageCount"], 2);
        assert_eq!(conversation["messages"][0]["role"], "user");
        assert_eq!(conversation["messages"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected() {
        let router = router_with(MockCompletionProvider::new());

        let (status, body) = send(&router, Method::POST, "/api/chat", Some(json!({ "sessionId": "abc" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let router = router_with(MockCompletionProvider::new());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_not_found() {
        let router = router_with(MockCompletionProvider::new());

        let (status, body) = send(&router, Method::DELETE, "/conversation/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");

        let (status, _) = send(&router, Method::GET, "/api/analytics/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_quota_failure_surfaces_message() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(|_, _, _| Err(CompletionError::QuotaExceeded("insufficient_quota".into())));
        let router = router_with(mock);

        let (status, body) = send(&router, Method::POST, "/chat", Some(json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], QUOTA_EXCEEDED_MESSAGE);
    }

    #[tokio::test]
    async fn test_reduced_context_is_reported_in_chat_response() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _| Err(CompletionError::ContextTooLong("maximum context length".into())));
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _| Ok("short answer".to_string()));
        let router = router_with(mock);

        let (status, body) = send(&router, Method::POST, "/api/chat", Some(json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "short answer");
        assert_eq!(body["reducedContext"], true);
        assert_eq!(body["messageCount"], 2);
    }

    #[tokio::test]
    async fn test_clear_then_sessions_and_health() {
        let router = router_with(canned_provider("ok"));

        let (_, first) = send(&router, Method::POST, "/chat", Some(json!({ "message": "hello" }))).await;
        let (_, _) = send(&router, Method::POST, "/chat", Some(json!({ "message": "what is rust?" }))).await;
        let session_id = first["sessionId"].as_str().unwrap().to_string();

        let (status, sessions) = send(&router, Method::GET, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sessions["sessions"].as_array().unwrap().len(), 2);

        let (status, health) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "OK");
        assert_eq!(health["activeSessions"], 2);
        assert_eq!(health["totalMessages"], 4);

        let (status, cleared) =
            send(&router, Method::DELETE, &format!("/conversation/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["message"], "Conversation cleared successfully");

        let (_, analytics) = send(&router, Method::GET, "/analytics", None).await;
        assert_eq!(analytics["activeSessions"], 1);
    }

    #[tokio::test]
    async fn test_service_descriptor_without_static_dir() {
        let router = router_with(MockCompletionProvider::new());

        let (status, body) = send(&router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Chat Memory Server API");
    }

    #[tokio::test]
    async fn test_cors_echoes_allowed_origin_only() {
        let router = router_with(MockCompletionProvider::new());

        let allowed = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:8080"
        );

        let denied = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
