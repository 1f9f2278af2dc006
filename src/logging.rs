/// Logging configuration.
///
/// Logs are stored in the data root under `logs/`. Each run appends to the
/// log file after a separator line.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "soulspace.log";

pub fn log_path(data_root: &Path) -> PathBuf {
    data_root.join(LOG_DIR).join(LOG_FILE)
}

/// Initializes file logging for a run.
///
/// Logs are written to `{data_root}/logs/soulspace.log`. `filter` is an
/// `EnvFilter` directive such as `info` or `soulspace=debug`; an invalid
/// directive falls back to `info`.
pub fn init_logging(data_root: &Path, filter: &str, command: &str) -> Result<()> {
    let log_dir = data_root.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok(); // Ignore error if already initialized

    let separator = format!(
        "\n{sep}\n[{ts}] New session: {command}\n{sep}\n",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        command = command
    );

    use std::io::Write;
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))
    {
        let _ = writeln!(file, "{}", separator);
    }

    tracing::info!("Logging initialized for command: {}", command);

    Ok(())
}
