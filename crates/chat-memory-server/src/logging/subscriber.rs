use anyhow::Result;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stdout plus a daily rolling file under `logs/`.
///
/// `RUST_LOG` selects the filter, `LOG_FORMAT=json` switches both layers to
/// JSON. Keep the returned guard alive for the lifetime of the process so the
/// file writer flushes.
pub fn init_logger() -> Result<WorkerGuard> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,chat_memory_server=debug,activity=info".to_string());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("chat-memory")
        .filename_suffix("log")
        .build("logs")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&log_level)?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(true),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(true),
                )
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(false),
                )
                .with(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}
