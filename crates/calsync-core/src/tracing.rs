//! Log subscriber setup shared by the calsync binaries.
//!
//! Logs always go to stderr so that command output on stdout stays
//! machine-readable.
//!
//! ```ignore
//! use calsync_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::from_flags(debug, json))?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose events are enabled by the default filter.
const CRATE_TARGETS: [&str; 4] = ["calsync_core", "calsync_caldav", "calsync_cli", "calsync"];

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One compact line per event, no timestamp.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to the calsync crates when `RUST_LOG` is unset.
    pub level: Level,
    pub format: LogFormat,
    /// Adds file and line to each record.
    pub with_location: bool,
    /// Explicit filter directive; takes precedence over `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Text,
            with_location: false,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for the command line: `--debug` raises the level and adds
    /// source locations, `--json` switches log lines to JSON.
    #[must_use]
    pub fn from_flags(debug: bool, json: bool) -> Self {
        Self {
            level: if debug { Level::DEBUG } else { Level::WARN },
            format: if json { LogFormat::Json } else { LogFormat::Text },
            with_location: debug,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The directive used when neither `filter` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref filter) = self.filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.default_directive())?),
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = config.env_filter()?;

    match config.format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr)
                .with_file(config.with_location)
                .with_line_number(config.with_location)
                .with_target(config.with_location);
            let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_file(config.with_location)
                .with_line_number(config.with_location)
                .with_target(true);
            let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet_text() {
        let config = TracingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Text);
        assert!(!config.with_location);
        assert!(config.filter.is_none());
    }

    #[test]
    fn flags_map_to_config() {
        let config = TracingConfig::from_flags(true, false);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.with_location);
        assert_eq!(config.format, LogFormat::Text);

        let config = TracingConfig::from_flags(false, true);
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn default_directive_covers_every_crate() {
        let config = TracingConfig::default().with_level(Level::TRACE);
        assert_eq!(
            config.default_directive(),
            "calsync_core=trace,calsync_caldav=trace,calsync_cli=trace,calsync=trace"
        );
    }

    #[test]
    fn explicit_filter_wins_and_is_validated() {
        let config = TracingConfig::default().with_filter("calsync_caldav=debug");
        assert!(config.env_filter().is_ok());

        let config = TracingConfig::default().with_filter("calsync_caldav=[");
        assert!(matches!(config.env_filter(), Err(TracingError::EnvFilter(_))));
    }
}
