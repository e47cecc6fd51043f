//! Logging setup.
//!
//! Console output goes to stderr (text or JSON). When a log directory is
//! configured, every event is also written to two daily files in it:
//! `process.<date>.log` (text) and `process.<date>.jsonl` (one JSON object
//! per line). Only the newest files of each kind are kept.

use crate::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// File name prefix for both log files.
pub const LOG_FILE_PREFIX: &str = "process";
/// Suffix of the text log.
pub const TEXT_LOG_SUFFIX: &str = "log";
/// Suffix of the JSON log.
pub const JSON_LOG_SUFFIX: &str = "jsonl";
/// Daily files kept per kind.
pub const MAX_LOG_FILES: usize = 5;

/// Logging options collected from the command line and config.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Debug level for this crate.
    pub verbose: bool,
    /// JSON on the console instead of text.
    pub json_console: bool,
    /// Directory for the daily log files.
    pub log_dir: Option<PathBuf>,
}

impl LogOptions {
    /// Use `dir` for log files unless it is empty.
    pub fn with_log_dir(mut self, dir: &Path) -> Self {
        self.log_dir = (!dir.as_os_str().is_empty()).then(|| dir.to_path_buf());
        self
    }
}

/// Daily rolling appender in `dir`, created if missing.
pub fn file_appender(dir: &Path, suffix: &str) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(suffix)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| crate::Error::other(format!("log file in {}: {}", dir.display(), e)))
}

/// Install the global subscriber.
///
/// The returned guards flush the file writers when dropped and must live
/// until the program exits. If the log directory cannot be used, logging
/// continues on the console only and a warning is emitted.
pub fn init(options: &LogOptions) -> Result<Vec<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if options.verbose {
        "tvshow_renamer=debug"
    } else {
        "tvshow_renamer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console_json = options
        .json_console
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_text = (!options.json_console)
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let mut guards = Vec::new();
    let mut file_error = None;
    let (text_file, json_file) = match options.log_dir.as_deref() {
        Some(dir) => match (
            file_appender(dir, TEXT_LOG_SUFFIX),
            file_appender(dir, JSON_LOG_SUFFIX),
        ) {
            (Ok(text), Ok(json)) => {
                let (text, text_guard) = tracing_appender::non_blocking(text);
                let (json, json_guard) = tracing_appender::non_blocking(json);
                guards.push(text_guard);
                guards.push(json_guard);
                (
                    Some(fmt::layer().with_ansi(false).with_target(false).with_writer(text)),
                    Some(fmt::layer().json().with_writer(json)),
                )
            }
            (Err(e), _) | (_, Err(e)) => {
                file_error = Some(e);
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(text_file)
        .with(json_file)
        .try_init()
        .map_err(|e| crate::Error::other(format!("logging already initialized: {}", e)))?;

    match (file_error, options.log_dir.as_deref()) {
        (Some(e), _) => tracing::warn!("File logging disabled: {}", e),
        (None, Some(dir)) => tracing::debug!("Logging to {}", dir.display()),
        (None, None) => {}
    }
    Ok(guards)
}
