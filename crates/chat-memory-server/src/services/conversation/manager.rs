use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::logging::{ActivityLog, ActivityLogger, ActivityStatus, ActivityType};

use super::analytics::{AggregateAnalytics, HealthStats, SessionAnalytics};
use super::cache::ConversationCache;
use super::gateway::{CompletionError, CompletionGateway, CompletionParams, CompletionProvider};
use super::heuristics::{HeuristicExtractor, HeuristicProfile, MessageSignals};
use super::store::SessionStore;
use super::types::{ChatMessage, Session, SessionContext, SessionId, SessionSummary, TurnOutcome};
use super::window::ContextWindower;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Orchestrates one chat turn: store, heuristics, windowing and completion.
pub struct ConversationManager {
    store: Arc<dyn SessionStore>,
    windower: ContextWindower,
    extractor: HeuristicExtractor,
    gateway: CompletionGateway,
    logger: ActivityLogger,
    max_topics: usize,
    started_at: Instant,
}

impl ConversationManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        windower: ContextWindower,
        extractor: HeuristicExtractor,
        gateway: CompletionGateway,
        max_topics: usize,
    ) -> Self {
        Self {
            store,
            windower,
            extractor,
            gateway,
            logger: ActivityLogger::new(),
            max_topics,
            started_at: Instant::now(),
        }
    }

    /// Wires the in-memory cache and the configured heuristic profile
    pub fn from_settings(settings: &Settings, provider: Arc<dyn CompletionProvider>) -> Self {
        let windower = ContextWindower::new(&settings.memory, &settings.prompts);
        let gateway = CompletionGateway::new(
            provider,
            CompletionParams::from(&settings.llm),
            windower.clone(),
        );
        info!(
            "Conversation manager ready: model={}, profile={:?}, window={}, retained={}",
            settings.llm.model,
            settings.heuristics.profile,
            settings.memory.max_window_messages,
            settings.memory.retained_messages
        );

        Self::new(
            Arc::new(ConversationCache::new()),
            windower,
            HeuristicExtractor::new(HeuristicProfile::for_kind(settings.heuristics.profile)),
            gateway,
            settings.memory.max_topics,
        )
    }

    pub fn generate_session_id() -> SessionId {
        uuid::Uuid::new_v4().to_string()
    }

    /// Runs one turn. The session's turn lock is held for the whole turn, so
    /// turns on the same session never interleave.
    ///
    /// Readers only take the short data lock and never wait on the completion
    /// call. On a completion failure the user message stays in the log and nothing
    /// else about the session changes apart from the failure counter.
    pub async fn handle_message(
        &self,
        session_id: Option<String>,
        message: &str,
    ) -> Result<TurnOutcome, ChatError> {
        if message.is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }

        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(Self::generate_session_id);

        let (handle, created) = self.store.get_or_create(&session_id).await;
        if created {
            self.logger.log(
                ActivityLog::builder(&session_id, ActivityType::SessionCreated)
                    .status(ActivityStatus::Info)
                    .build(),
            );
        }

        let _turn = handle.begin_turn().await;
        let start_time = Instant::now();

        let (bundle, message_count) = handle.write(|session| {
            session.messages.push(ChatMessage::user(message));
            (self.windower.build(&session.messages), session.message_count())
        });
        self.logger.log(
            ActivityLog::builder(&session_id, ActivityType::RequestReceived)
                .status(ActivityStatus::Info)
                .message_len(message.len())
                .message_count(message_count)
                .build(),
        );

        let signals = self.extractor.analyze(message);
        debug!(
            "Session {}: submitting {} of {} messages",
            session_id,
            bundle.windowed_messages.len(),
            message_count
        );

        // Only the turn lock is held while waiting on the completion service
        let completion = match self.gateway.complete(&bundle).await {
            Ok(completion) => completion,
            Err(e) => {
                handle.write(|session| session.metadata.failed_turns += 1);
                self.logger.log(
                    ActivityLog::builder(&session_id, ActivityType::CompletionFailed)
                        .message_count(message_count)
                        .processing_time(start_time.elapsed().as_millis() as u64)
                        .error(e.to_string(), error_kind(&e))
                        .build(),
                );
                return Err(e.into());
            }
        };

        if completion.reduced_context {
            self.logger.log(
                ActivityLog::builder(&session_id, ActivityType::ContextReduced)
                    .status(ActivityStatus::Warning)
                    .message_count(message_count)
                    .build(),
            );
        }

        let (trimmed, message_count, context) = handle.write(|session| {
            session.messages.push(ChatMessage::assistant(completion.text.clone()));
            fold_context(&mut session.context, signals, self.max_topics);

            session.metadata.completed_turns += 1;
            session.metadata.total_response_ms += completion.duration_ms;
            if completion.reduced_context {
                session.metadata.reduced_context_turns += 1;
            }

            let trimmed = self.windower.trim_log(&mut session.messages);
            (trimmed, session.message_count(), session.context.clone())
        });

        if trimmed > 0 {
            self.logger.log(
                ActivityLog::builder(&session_id, ActivityType::LogTrimmed)
                    .status(ActivityStatus::Info)
                    .message_count(message_count)
                    .build(),
            );
        }

        self.logger.log(
            ActivityLog::builder(&session_id, ActivityType::TurnCompleted)
                .message_count(message_count)
                .processing_time(start_time.elapsed().as_millis() as u64)
                .build(),
        );

        Ok(TurnOutcome {
            response: completion.text,
            session_id,
            message_count,
            context,
            reduced_context: completion.reduced_context,
        })
    }

    pub async fn get_conversation(&self, session_id: &str) -> Result<Session, ChatError> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))
    }

    pub async fn clear_conversation(&self, session_id: &str) -> Result<(), ChatError> {
        if !self.store.delete(session_id).await {
            return Err(ChatError::NotFound(session_id.to_string()));
        }
        self.logger.log(ActivityLog::builder(session_id, ActivityType::SessionCleared).build());
        Ok(())
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.store.list().await
    }

    pub async fn session_analytics(&self, session_id: &str) -> Result<SessionAnalytics, ChatError> {
        let session = self.get_conversation(session_id).await?;
        Ok(SessionAnalytics::from_session(&session, Utc::now()))
    }

    pub async fn analytics(&self) -> AggregateAnalytics {
        let mut aggregate = AggregateAnalytics::default();
        for summary in self.store.list().await {
            // Sessions deleted between list and get are skipped
            if let Some(session) = self.store.get(&summary.session_id).await {
                aggregate.accumulate(&session);
            }
        }
        aggregate.finish(self.uptime_seconds())
    }

    pub async fn health(&self) -> HealthStats {
        let sessions = self.store.list().await;
        HealthStats {
            active_sessions: sessions.len(),
            total_messages: sessions.iter().map(|s| s.message_count).sum(),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Incremental fold of one message's signals into the session context
fn fold_context(context: &mut SessionContext, signals: MessageSignals, max_topics: usize) {
    context.topics.extend(signals.topics);
    if context.topics.len() > max_topics {
        let excess = context.topics.len() - max_topics;
        context.topics.drain(..excess);
    }
    context.preferences.extend(signals.preferences);
    context.tone = Some(signals.tone);
    context.intent = Some(signals.intent);
    context.last_interaction = Some(Utc::now());
}

fn error_kind(error: &CompletionError) -> &'static str {
    match error {
        CompletionError::ContextTooLong(_) => "context_too_long",
        CompletionError::QuotaExceeded(_) => "quota_exceeded",
        CompletionError::InvalidCredential(_) => "invalid_credential",
        CompletionError::Unavailable(_) => "unavailable",
    }
}
