use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::services::conversation::{ChatMessage, CompletionError, CompletionParams, CompletionProvider};

/// Error bodies are truncated before they reach logs or error values
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: LlmConfig,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for LlmService {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, CompletionError> {
        debug!("Starting chat generation with {} messages", messages.len());

        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        wire.extend(messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let request = ChatCompletionRequest {
            model: &params.model,
            messages: wire,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Unavailable("request to completion service timed out".to_string())
                } else {
                    CompletionError::Unavailable(format!("Failed to call LLM API: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_error(status, &body);
            warn!("LLM API error: {} - {}", status, truncate(&body));
            return Err(error);
        }

        let chat_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            CompletionError::Unavailable(format!("Failed to parse LLM response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Unavailable("No choices returned from LLM".to_string()))
    }
}

/// Maps a non-success response onto the completion failure taxonomy
pub fn classify_error(status: StatusCode, body: &str) -> CompletionError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let detail = envelope.error;
    let code = detail.code.as_deref().unwrap_or_default();
    let kind = detail.kind.as_deref().unwrap_or_default();
    let message = if detail.message.is_empty() {
        format!("HTTP {}: {}", status, truncate(body))
    } else {
        detail.message.clone()
    };
    let lowered = message.to_lowercase();

    if code == "context_length_exceeded" || lowered.contains("maximum context length") {
        return CompletionError::ContextTooLong(message);
    }
    if code == "insufficient_quota" || kind == "insufficient_quota" || lowered.contains("quota") {
        return CompletionError::QuotaExceeded(message);
    }
    if status == StatusCode::UNAUTHORIZED || code == "invalid_api_key" {
        return CompletionError::InvalidCredential(message);
    }
    CompletionError::Unavailable(message)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: String) -> LlmService {
        LlmService::new(LlmConfig {
            base_url,
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        })
    }

    fn params() -> CompletionParams {
        CompletionParams::from(&LlmConfig::default())
    }

    async fn failing_server(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_complete_sends_system_prompt_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 300,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "Hello!" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hi!" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = service(server.uri())
            .complete("be brief", &[ChatMessage::user("Hello!")], &params())
            .await
            .unwrap();
        assert_eq!(text, "Hi!");
    }

    #[tokio::test]
    async fn test_context_length_error_is_classified() {
        let server = failing_server(
            400,
            json!({ "error": {
                "message": "This model's maximum context length is 4097 tokens.",
                "type": "invalid_request_error",
                "code": "context_length_exceeded"
            }}),
        )
        .await;

        let err = service(server.uri())
            .complete("sys", &[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ContextTooLong(_)));
    }

    #[tokio::test]
    async fn test_quota_error_is_classified() {
        let server = failing_server(
            429,
            json!({ "error": {
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "type": "insufficient_quota",
                "code": "insufficient_quota"
            }}),
        )
        .await;

        let err = service(server.uri())
            .complete("sys", &[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn test_invalid_key_is_classified() {
        let server = failing_server(
            401,
            json!({ "error": { "message": "Incorrect API key provided", "code": "invalid_api_key" }}),
        )
        .await;

        let err = service(server.uri())
            .complete("sys", &[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_server_error_and_empty_choices_are_unavailable() {
        let server = failing_server(503, json!({ "error": { "message": "overloaded" }})).await;
        let err = service(server.uri())
            .complete("sys", &[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable(_)));

        let server = failing_server(200, json!({ "choices": [] })).await;
        let err = service(server.uri())
            .complete("sys", &[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable(_)));
    }

    #[test]
    fn test_classify_non_json_body() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            CompletionError::Unavailable(msg) => assert!(msg.contains("502")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, ""),
            CompletionError::InvalidCredential(_)
        ));
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(2000);
        let out = truncate(&long);
        assert!(out.ends_with("[truncated]"));
        assert!(out.len() < 600);
    }
}
