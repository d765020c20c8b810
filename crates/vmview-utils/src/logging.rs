//! # Logging Utilities
//!
//! Logging infrastructure for vmview using `tracing`.
//!
//! The formatter engine only emits events; this module decides where they go:
//! - Pretty output for interactive use, JSON for log collection
//! - Level filtering through `RUST_LOG` or an explicit level
//! - Optional daily-rolling log file next to the console output
//!
//! Console output goes to stderr so that command output on stdout (LLDB
//! commands, rendered trees) can be piped without log lines mixed in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vmview_utils::init_logging;
//!
//! init_logging().expect("Failed to initialize logging");
//! tracing::info!("formatter table built");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=vmview_core=trace`)
//! - `VMVIEW_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `VMVIEW_LOG_FILE`: Optional path to a log file (console only when unset)
//!
//! ## Examples
//!
//! ```rust,no_run
//! use vmview_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "VMVIEW_LOG_FORMAT";
/// Environment variable naming an optional log file
pub const LOG_FILE_ENV: &str = "VMVIEW_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format for log collection
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG`, `VMVIEW_LOG_FORMAT` and `VMVIEW_LOG_FILE`. The level
/// defaults to `WARN` so that CLI output stays clean unless asked otherwise.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `VMVIEW_LOG_FORMAT` holds an unknown format
/// - The directory of `VMVIEW_LOG_FILE` cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::Pretty,
    };
    init_logging_internal(format, None)
}

/// Initialize logging with an explicit level and format
///
/// The explicit level takes precedence over `RUST_LOG`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the directory of
/// `VMVIEW_LOG_FILE` cannot be created.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_internal(format, Some(level.into()))
}

/// Filter priority: explicit level, then `RUST_LOG`, then `WARN`
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    if let Some(level) = explicit_level {
        return EnvFilter::new(level.to_string());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
}

/// Split a log file path into the directory and file name the appender expects
fn split_log_path(path: &Path) -> (PathBuf, PathBuf)
{
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_name = path
        .file_name()
        .map_or_else(|| PathBuf::from("vmview.log"), PathBuf::from);
    (directory, file_name)
}

/// Non-blocking writer for the log file
///
/// The log directory is created up front so an unusable path surfaces as
/// [`LoggingError::FileError`]. The worker guard is leaked: the subscriber is
/// global and lives until process exit, so the writer must too.
fn file_writer(path: &Path) -> Result<tracing_appender::non_blocking::NonBlocking, LoggingError>
{
    let (directory, file_name) = split_log_path(path);
    fs::create_dir_all(&directory)?;
    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    std::mem::forget(guard);
    Ok(non_blocking)
}

fn init_logging_internal(format: LogFormat, explicit_level: Option<Level>) -> Result<(), LoggingError>
{
    let env_filter = build_filter(explicit_level);
    let log_file = env::var(LOG_FILE_ENV).ok().map(PathBuf::from);

    let result = match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            if let Some(file_path) = log_file {
                let file_layer = fmt::layer()
                    .with_writer(file_writer(&file_path)?)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_filter(env_filter);

                Registry::default().with(console_layer).with(file_layer).try_init()
            } else {
                Registry::default().with(console_layer).try_init()
            }
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            if let Some(file_path) = log_file {
                let file_layer = fmt::layer()
                    .json()
                    .with_writer(file_writer(&file_path)?)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(env_filter);

                Registry::default().with(console_layer).with(file_layer).try_init()
            } else {
                Registry::default().with(console_layer).try_init()
            }
        }
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
