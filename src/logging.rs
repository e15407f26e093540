//! Logging setup.
//!
//! Headless modes log to stderr. The dashboard owns the terminal, so its logs
//! go to a file in the user cache directory instead.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "raman-compare.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr. Repeated calls are no-ops.
pub fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn log_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("raman-compare")
}

/// Log to a file while the dashboard is on screen. Returns the log file path.
pub fn init_file(default_level: &str) -> anyhow::Result<PathBuf> {
    let dir = log_directory();
    std::fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .is_ok();
    if installed {
        let _ = LOG_GUARD.set(guard);
    }
    Ok(dir.join(LOG_FILE_NAME))
}
