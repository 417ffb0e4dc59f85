use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_DIR: &str = "./logs";
const LOG_FILE_PREFIX: &str = "garden_backend.log";

/// Initialize tracing with file and console logging
///
/// Two layers share one registry:
/// 1. Console (stdout): INFO and above, or whatever `RUST_LOG` asks for
/// 2. File: DEBUG and above, rotated daily under `./logs`
///    (garden_backend.log.2025-04-01, garden_backend.log.2025-04-02, ...)
///
/// # Returns
/// WorkerGuard that must be kept alive for the entire program lifetime.
/// Buffered file output is flushed when it is dropped.
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // no ANSI escapes in log files
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .with_filter(console_filter);

    // panics if called twice
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Tracing initialized (console=INFO+, file=DEBUG+)");

    guard
}
