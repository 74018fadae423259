//! CLI error types.

use calsync_caldav::{CalDavError, ServiceError};
use calsync_core::{RuleError, TracingError};
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    /// A secret reference in the configuration could not be resolved.
    #[error("secret error: {0}")]
    Secret(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid recurrence rule: {0}")]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] CalDavError),

    #[error("logging setup failed: {0}")]
    Tracing(#[from] TracingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
