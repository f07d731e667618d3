//! Logging Infrastructure

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "album_fetcher=info";

/// Initialize the logger
///
/// Logs go to stdout, or to a daily rolling file `<log_dir>/<file_stem>.log.<date>`
/// when a log directory is given.
pub fn init_logger(log_dir: Option<&Path>, file_stem: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(dir) = log_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("cannot create log directory {}: {e}", dir.display());
        } else {
            let file_appender = tracing_appender::rolling::daily(dir, format!("{file_stem}.log"));
            subscriber.with_writer(file_appender).with_ansi(false).init();
            return;
        }
    }

    subscriber.init();
}
