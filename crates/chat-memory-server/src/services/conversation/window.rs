use tracing::debug;

use crate::config::{MemoryConfig, PromptsConfig};

use super::types::{ChatMessage, PromptBundle};

/// Chooses which part of a session log is submitted to the completion service.
#[derive(Debug, Clone)]
pub struct ContextWindower {
    system_prompt: String,
    fallback_system_prompt: String,
    max_messages: usize,
    head_messages: usize,
    fallback_tail: usize,
    retained_messages: usize,
}

impl ContextWindower {
    pub fn new(memory: &MemoryConfig, prompts: &PromptsConfig) -> Self {
        Self {
            system_prompt: prompts.main_system_prompt.clone(),
            fallback_system_prompt: prompts.fallback_system_prompt.clone(),
            max_messages: memory.max_window_messages,
            head_messages: memory.head_messages.min(memory.max_window_messages),
            fallback_tail: memory.fallback_tail_messages,
            retained_messages: memory.retained_messages,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Whole log when it fits, otherwise the first `head` messages followed
    /// by the most recent `max - head`, in original order.
    pub fn build(&self, messages: &[ChatMessage]) -> PromptBundle {
        PromptBundle {
            system_prompt: self.system_prompt.clone(),
            windowed_messages: self.window(messages),
        }
    }

    pub fn window(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        if messages.len() <= self.max_messages {
            return messages.to_vec();
        }

        let tail = self.max_messages - self.head_messages;
        debug!(
            "Windowing {} messages to first {} + last {}",
            messages.len(),
            self.head_messages,
            tail
        );

        let mut windowed = Vec::with_capacity(self.max_messages);
        windowed.extend_from_slice(&messages[..self.head_messages]);
        windowed.extend_from_slice(&messages[messages.len() - tail..]);
        windowed
    }

    /// Stricter budget used once after a context-length rejection: only the
    /// most recent messages of the bundle and the short system prompt.
    pub fn reduced_budget(&self, bundle: &PromptBundle) -> PromptBundle {
        let msgs = &bundle.windowed_messages;
        let start = msgs.len().saturating_sub(self.fallback_tail);
        PromptBundle {
            system_prompt: self.fallback_system_prompt.clone(),
            windowed_messages: msgs[start..].to_vec(),
        }
    }

    /// Drops the oldest stored messages beyond the retention bound.
    /// Returns how many were removed.
    pub fn trim_log(&self, messages: &mut Vec<ChatMessage>) -> usize {
        if messages.len() <= self.retained_messages {
            return 0;
        }
        let excess = messages.len() - self.retained_messages;
        messages.drain(..excess);
        excess
    }
}

impl Default for ContextWindower {
    fn default() -> Self {
        Self::new(&MemoryConfig::default(), &PromptsConfig::default())
    }
}
