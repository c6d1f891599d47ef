use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::LlmConfig;

use super::types::{ChatMessage, PromptBundle};
use super::window::ContextWindower;

/// Failures reported by the completion service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Context too long: {0}")]
    ContextTooLong(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Completion service unavailable: {0}")]
    Unavailable(String),
}

/// Model parameters, fixed per deployment
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl From<&LlmConfig> for CompletionParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
        }
    }
}

/// One network call to a completion service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Answered from the reduced bundle after a context-length rejection
    pub reduced_context: bool,
    pub duration_ms: u64,
}

/// Wraps the provider with fixed parameters and the context-overflow fallback
pub struct CompletionGateway {
    provider: Arc<dyn CompletionProvider>,
    params: CompletionParams,
    windower: ContextWindower,
}

impl CompletionGateway {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        params: CompletionParams,
        windower: ContextWindower,
    ) -> Self {
        Self {
            provider,
            params,
            windower,
        }
    }

    /// Only `ContextTooLong` is retried, exactly once, with the reduced bundle.
    /// A second overflow is reported as `Unavailable`.
    pub async fn complete(&self, bundle: &PromptBundle) -> Result<Completion, CompletionError> {
        let start = Instant::now();

        let reason = match self.call(bundle).await {
            Ok(text) => {
                return Ok(Completion {
                    text,
                    reduced_context: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                })
            }
            Err(CompletionError::ContextTooLong(reason)) => reason,
            Err(e) => {
                error!("Completion failed: {}", e);
                return Err(e);
            }
        };

        let reduced = self.windower.reduced_budget(bundle);
        warn!(
            "Context too long ({}), retrying with {} of {} messages",
            reason,
            reduced.windowed_messages.len(),
            bundle.windowed_messages.len()
        );

        match self.call(&reduced).await {
            Ok(text) => Ok(Completion {
                text,
                reduced_context: true,
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            Err(CompletionError::ContextTooLong(reason)) => {
                error!("Reduced context still too long: {}", reason);
                Err(CompletionError::Unavailable(format!(
                    "context too long after reduction: {}",
                    reason
                )))
            }
            Err(e) => {
                error!("Completion retry failed: {}", e);
                Err(e)
            }
        }
    }

    async fn call(&self, bundle: &PromptBundle) -> Result<String, CompletionError> {
        debug!(
            "Calling completion service with {} messages",
            bundle.windowed_messages.len()
        );
        self.provider
            .complete(&bundle.system_prompt, &bundle.windowed_messages, &self.params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    fn bundle(n: usize) -> PromptBundle {
        let windower = ContextWindower::default();
        let messages: Vec<ChatMessage> = (0..n)
            .map(|i| ChatMessage::user(format!("m{}", i)))
            .collect();
        windower.build(&messages)
    }

    fn gateway(mock: MockCompletionProvider) -> CompletionGateway {
        CompletionGateway::new(
            Arc::new(mock),
            CompletionParams::from(&LlmConfig::default()),
            ContextWindower::default(),
        )
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .times(1)
            .withf(|_, messages, params| messages.len() == 20 && params.max_tokens == 300)
            .returning(|_, _, _| Ok("hi there".to_string()));

        let completion = gateway(mock).complete(&bundle(20)).await.unwrap();
        assert_eq!(completion.text, "hi there");
        assert!(!completion.reduced_context);
    }

    #[tokio::test]
    async fn test_context_too_long_retries_once_with_reduced_bundle() {
        let full_prompt = ContextWindower::default().system_prompt().to_string();
        let mut seq = Sequence::new();
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, messages, _| messages.len() == 20)
            .returning(|_, _, _| Err(CompletionError::ContextTooLong("too many tokens".into())));
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |prompt, messages, _| {
                messages.len() == 10 && messages[9].content == "m19" && prompt != full_prompt
            })
            .returning(|_, _, _| Ok("short answer".to_string()));

        let completion = gateway(mock).complete(&bundle(20)).await.unwrap();
        assert_eq!(completion.text, "short answer");
        assert!(completion.reduced_context);
    }

    #[tokio::test]
    async fn test_second_overflow_is_reported_unavailable() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .times(2)
            .returning(|_, _, _| Err(CompletionError::ContextTooLong("still too long".into())));

        let err = gateway(mock).complete(&bundle(12)).await.unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        for failure in [
            CompletionError::QuotaExceeded("no credit".into()),
            CompletionError::InvalidCredential("bad key".into()),
            CompletionError::Unavailable("502".into()),
        ] {
            let expected = failure.clone();
            let mut mock = MockCompletionProvider::new();
            mock.expect_complete()
                .times(1)
                .returning(move |_, _, _| Err(failure.clone()));

            let err = gateway(mock).complete(&bundle(4)).await.unwrap_err();
            assert_eq!(err, expected);
        }
    }
}
