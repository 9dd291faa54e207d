use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the life of the process.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    let _ = fs::create_dir_all(log_dir);

    // Create a non-blocking file appender for daily log rotation
    let file_appender = tracing_appender::rolling::daily(log_dir, "ingest.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // JSON lines to the file, human-readable output on the console
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "pension_ingest=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
