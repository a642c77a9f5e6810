//! Structured logging setup.
//!
//! JSON output in production, pretty output elsewhere, written through a
//! non-blocking writer to stdout, stderr or a rotated file.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Directory for log files (when output is `File`)
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_name: String,
    pub service_version: String,
    /// e.g. "development", "staging", "production"
    pub environment: String,
    /// Rotate log files daily
    pub enable_rotation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let format = if is_production(&environment) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            format,
            // stdout carries command output
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: env!("CARGO_PKG_NAME").to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            enable_rotation: true,
        }
    }
}

fn is_production(environment: &str) -> bool {
    environment == "production" || environment == "prod"
}

impl LoggingConfig {
    /// Defaults overridden by `LOG_FORMAT`, `LOG_OUTPUT` and `LOG_DIR`.
    /// Unrecognized values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Ok(output) = env::var("LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                "file" => LogOutput::File,
                _ => config.output,
            };
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        config
    }

    fn default_directive(&self) -> &'static str {
        if is_production(&self.environment) {
            "info"
        } else {
            "debug"
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
///
/// The returned guard must live as long as the process so buffered lines
/// are flushed.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

            let file_appender = if config.enable_rotation {
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix)
            } else {
                tracing_appender::rolling::never(&config.log_dir, &config.log_file_prefix)
            };
            tracing_appender::non_blocking(file_appender)
        }
    };

    let registry = tracing_subscriber::registry();

    let installed = match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter);
            registry.with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(config.output != LogOutput::File)
                .with_filter(env_filter);
            registry.with(fmt_layer).try_init()
        }
    };
    installed.context("a global tracing subscriber is already installed")?;

    tracing::debug!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        "logging initialized"
    );

    Ok(guard)
}

/// Span wrapping one workbook-facing tool call.
pub fn workbook_span(tool: &'static str, sheet: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "workbook_operation",
        tool,
        sheet = sheet.unwrap_or_default(),
        service = env!("CARGO_PKG_NAME"),
    )
}
