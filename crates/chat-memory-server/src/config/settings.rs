use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::services::conversation::HeuristicProfileKind;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub heuristics: HeuristicsConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with a prebuilt frontend, served for unmatched routes.
    pub static_dir: Option<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: None,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    /// Exact origins or patterns with a single `*` (e.g. `https://*.vercel.app`)
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: [
                "http://localhost:8080",
                "http://127.0.0.1:8080",
                "https://*.vercel.app",
                "https://*.netlify.app",
                "https://*.herokuapp.com",
                "https://*.railway.app",
                "https://*.render.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allow_credentials: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    /// Upper bound of messages submitted per completion request
    pub max_window_messages: usize,
    /// Leading messages always kept when the window is cut
    pub head_messages: usize,
    /// Recent messages kept in the reduced bundle after a context overflow
    pub fallback_tail_messages: usize,
    /// Messages kept in the stored session log after each turn
    pub retained_messages: usize,
    pub max_topics: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_window_messages: 20,
            head_messages: 2,
            fallback_tail_messages: 10,
            retained_messages: 20,
            max_topics: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HeuristicsConfig {
    pub profile: HeuristicProfileKind,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    pub main_system_prompt: String,
    pub fallback_system_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            main_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_system_prompt: FALLBACK_SYSTEM_PROMPT.to_string(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an intelligent, helpful, and friendly AI assistant with the following capabilities:

1. **Context Awareness**: Remember previous conversations and refer back to them when relevant
2. **Personality**: Be warm, engaging, and conversational while remaining professional
3. **Memory**: Use conversation history to provide more personalized and contextual responses
4. **Knowledge**: Provide accurate, helpful information across various topics
5. **Adaptability**: Adjust your communication style based on the user's tone and needs
6. **Proactivity**: Ask follow-up questions when appropriate to better understand user needs
7. **Clarity**: Explain complex concepts in simple terms when needed
8. **Empathy**: Show understanding and emotional intelligence in your responses

Guidelines:
- Keep responses concise but informative (150-300 words max)
- Use the conversation history to provide contextually relevant responses
- Ask clarifying questions when user intent is unclear
- Provide actionable advice when appropriate
- Use examples and analogies to illustrate points
- Maintain a consistent, helpful personality throughout the conversation

Remember: You have access to the conversation history, so use it to provide more intelligent and contextual responses."#;

const FALLBACK_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Keep responses concise and use the recent conversation for context.";

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_legacy_env();
        Ok(settings)
    }

    /// `OPENAI_API_KEY` and `PORT` are the variables existing deployments set.
    fn apply_legacy_env(&mut self) {
        if self.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.llm.api_key = key;
            }
        }

        if std::env::var("APP__SERVER__PORT").is_err() {
            if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
                self.server.port = port;
            }
        }
    }
}
