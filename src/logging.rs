//! Logging configuration and initialization.
//!
//! This module sets up the tracing subscriber for embedding binaries,
//! supporting stdout, stderr, and file output with configurable formats.
//! The persisted configuration file is domain state, not application
//! settings, so logging options come from the caller (CLI flags in the
//! bundled binary).

use std::fs::OpenOptions;
use std::io;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for structured logging.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}', expected pretty, compact, or json"
            )),
        }
    }
}

/// Logging options supplied by the embedding binary.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,

    /// Output destination: stdout, stderr, or a file path.
    pub output: String,

    /// Log format.
    pub format: LogFormat,

    /// Include target (module path) in logs.
    pub include_target: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "stdout".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

/// Initializes the logging system.
///
/// Returns a guard that must be kept alive for the duration of the
/// program to ensure all logs are flushed.
///
/// # Example
///
/// ```ignore
/// let options = LogOptions::default();
/// let _guard = init_logging(&options, None)?;
/// tracing::info!("Logging initialized");
/// ```
pub fn init_logging(
    options: &LogOptions,
    level_override: Option<String>,
) -> io::Result<Option<WorkerGuard>> {
    let level = level_override
        .as_ref()
        .unwrap_or(&options.level)
        .to_lowercase();

    // RUST_LOG wins over configured levels when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level_filter = match level.as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        EnvFilter::new(level_filter)
    });

    let (writer, guard): (NonBlocking, WorkerGuard) =
        match options.output.to_lowercase().as_str() {
            "stdout" => tracing_appender::non_blocking(io::stdout()),
            "stderr" => tracing_appender::non_blocking(io::stderr()),
            path => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                tracing_appender::non_blocking(file)
            }
        };

    match options.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(options.include_target);

            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_target(options.include_target);

            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(options.include_target);

            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(Some(guard))
}

/// Parses a log level string to a tracing Level.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
