//! Conversation memory management module
//!
//! Provides in-memory conversation state management with:
//! - Per-session serialized access (DashMap of session mutexes)
//! - Bounded context windows and retention trimming
//! - Keyword heuristics for topic, tone, intent and preferences
//! - A completion gateway with one bounded retry on context overflow

pub mod analytics;
mod cache;
pub mod gateway;
pub mod heuristics;
pub mod manager;
mod store;
pub mod types;
mod window;

pub use analytics::{AggregateAnalytics, HealthStats, SessionAnalytics};
pub use cache::ConversationCache;
pub use gateway::{Completion, CompletionError, CompletionGateway, CompletionParams, CompletionProvider};
pub use heuristics::{HeuristicExtractor, HeuristicProfile, HeuristicProfileKind, MessageSignals};
pub use manager::{ChatError, ConversationManager};
pub use store::{SessionHandle, SessionSlot, SessionStore};
pub use types::{
    ChatMessage, PreferenceKind, PromptBundle, Role, Session, SessionContext, SessionId,
    SessionSummary, TurnOutcome,
};
pub use window::ContextWindower;
