use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use chat_memory_server::config::Settings;
use chat_memory_server::handlers::build_router;
use chat_memory_server::logging::init_logger;
use chat_memory_server::services::{ConversationManager, LlmService};
use chat_memory_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG and LOG_FORMAT may come from .env
    dotenvy::dotenv().ok();

    // Keep the guard alive so the file writer flushes
    let _log_guard = init_logger()?;

    info!("🚀 Starting Chat Memory Server...");

    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    if settings.llm.api_key.is_empty() {
        warn!("No LLM API key configured; chat requests will fail until OPENAI_API_KEY is set");
    }

    let llm_service = Arc::new(LlmService::new(settings.llm.clone()));
    let conversation_manager = Arc::new(ConversationManager::from_settings(&settings, llm_service));

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let app = build_router(AppState::new(conversation_manager, settings));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
