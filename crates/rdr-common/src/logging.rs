//! Logging configuration and initialization
//!
//! Every RDR binary routes its diagnostics through `tracing`. Console output
//! goes to stderr so that command results on stdout stay machine-readable.
//! File output uses a daily-rotated appender.
//!
//! Environment variables (all optional):
//! - `RDR_LOG_LEVEL`: trace, debug, info, warn, error
//! - `RDR_LOG_OUTPUT`: console, file, both
//! - `RDR_LOG_FORMAT`: text, json
//! - `RDR_LOG_DIR`: directory for rotated log files
//! - `RDR_LOG_FILTER`: extra directives, e.g. `rdr_import=trace,csv=warn`
//!
//! `RUST_LOG` is honored as well and takes precedence over the level.
//!
//! # Example
//!
//! ```no_run
//! use rdr_common::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env().unwrap_or_default();
//! let _guard = init_logging(&config).ok().flatten();
//! tracing::info!("ready");
//! ```

use crate::error::{RdrError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = RdrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(RdrError::LogConfig(format!("invalid log level '{}'", other))),
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl std::str::FromStr for LogOutput {
    type Err = RdrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" | "stderr" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            other => Err(RdrError::LogConfig(format!("invalid log output '{}'", other))),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = RdrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(RdrError::LogConfig(format!("invalid log format '{}'", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub output: LogOutput,
    pub format: LogFormat,
    /// Directory for rotated files, used when `output` includes a file
    pub log_dir: PathBuf,
    /// File name prefix, e.g. "rdr-import" -> "rdr-import.2024-01-18"
    pub log_file_prefix: String,
    /// Extra comma-separated filter directives
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            output: LogOutput::Console,
            format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "rdr".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    /// Start from the defaults and apply any `RDR_LOG_*` variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `RDR_LOG_*` variables on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(level) = std::env::var("RDR_LOG_LEVEL") {
            self.level = level.parse()?;
        }
        if let Ok(output) = std::env::var("RDR_LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Ok(format) = std::env::var("RDR_LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Ok(dir) = std::env::var("RDR_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Ok(filter) = std::env::var("RDR_LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        Ok(self)
    }

    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level.to_tracing_level()).into())
            .from_env_lossy();

        if let Some(directives) = &self.filter_directives {
            for directive in directives.split(',').filter(|d| !d.trim().is_empty()) {
                let directive = directive.trim().parse().map_err(|e| {
                    RdrError::LogConfig(format!("bad filter directive '{}': {}", directive, e))
                })?;
                filter = filter.add_directive(directive);
            }
        }

        Ok(filter)
    }
}

#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.config.output = output;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn log_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.log_file_prefix = prefix.into();
        self
    }

    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Install the global subscriber
///
/// Call once at startup. When file output is enabled the returned guard must
/// be held until exit, otherwise buffered lines are lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = config.env_filter()?;

    let (file_writer, guard) = if config.output.to_file() {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };
    let console = config.output.to_console();

    let init = match config.format {
        LogFormat::Text => {
            let console_layer = console.then(|| {
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
            });
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
            });
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()
        },
        LogFormat::Json => {
            let console_layer = console.then(|| {
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
            });
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
            });
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()
        },
    };

    init.map_err(|e| RdrError::LogConfig(e.to_string()))?;
    Ok(guard)
}
