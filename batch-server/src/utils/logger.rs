//! Logging Infrastructure
//!
//! Structured logging setup; stdout by default, daily rolling file when
//! `LOG_DIR` is set.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "batch_server=info,http_access=info,tower_http=info";

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_dir: Option<&Path>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && std::fs::create_dir_all(dir).is_ok()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "batch-server.log");
        subscriber.with_writer(file_appender).with_ansi(false).init();
        return;
    }

    subscriber.init();
}
