//! Structured logging initialisation.
//!
//! Two output formats are supported:
//! - [`LogFormat::Human`]: readable lines for a terminal.
//! - [`LogFormat::Json`]: newline-delimited JSON for log collection.
//!
//! `RUST_LOG` overrides the caller-supplied level when it is set
//! (e.g. `"info"`, `"warn,hookpay_wallet_core=debug"`).

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format {0:?}, expected \"human\" or \"json\"")]
    UnknownFormat(String),

    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::UnknownFormat(s.to_string())),
        }
    }
}

fn filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global tracing subscriber. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), LoggingError> {
    let filter = filter(level)?;
    let installed = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::UnknownFormat(_))
        ));
    }

    #[test]
    fn second_install_is_reported() {
        let first = init_logging(LogFormat::Human, "warn");
        let second = init_logging(LogFormat::Json, "warn");
        assert!(first.is_ok() || matches!(first, Err(LoggingError::AlreadyInstalled)));
        assert!(matches!(second, Err(LoggingError::AlreadyInstalled)));
    }
}
