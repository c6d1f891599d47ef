pub mod settings;

pub use settings::{
    CorsConfig, HeuristicsConfig, LlmConfig, MemoryConfig, PromptsConfig, ServerConfig, Settings,
};
