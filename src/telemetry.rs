//! Logging setup: coloured stderr plus a JSON rolling log file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const DEFAULT_LOG_FILE: &str = "logs/covid_series.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub file_path: PathBuf,
    /// Default directive for the stderr layer when `RUST_LOG` is unset.
    pub stderr_level: String,
    /// Default directive for the JSON file layer when `RUST_LOG_JSON` is unset.
    pub file_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_LOG_FILE),
            stderr_level: "info".to_string(),
            file_level: "debug".to_string(),
        }
    }
}

impl LogConfig {
    /// Defaults with the file path taken from `LOG_FILE_PATH` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("LOG_FILE_PATH") {
            config.file_path = PathBuf::from(path);
        }
        config
    }

    fn split_path(&self) -> (&Path, &OsStr) {
        let dir = self
            .file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("logs"));
        let name = self
            .file_path
            .file_name()
            .unwrap_or(OsStr::new("covid_series.log"));
        (dir, name)
    }
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the program; dropping it
/// flushes and stops the file writer.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    let (log_dir, log_file_name) = config.split_path();
    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(config.stderr_level.parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::from_env("RUST_LOG_JSON").add_directive(config.file_level.parse()?),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(file_guard)
}
