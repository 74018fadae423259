//! Error types for CalDAV requests.
//!
//! [`CalDavError`] never crosses the [`CalendarStore`](crate::CalendarStore)
//! boundary: the transport logs it and reports a fail-soft result instead.
//! It is still a full error type so the client can be used on its own.

use std::fmt;
use thiserror::Error;

/// Category of a CalDAV failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalDavErrorCode {
    /// 401, or credentials missing.
    AuthenticationFailed,
    /// 403.
    AuthorizationFailed,
    /// Connection refused, DNS failure, TLS failure.
    NetworkError,
    /// The configured request timeout elapsed.
    Timeout,
    /// 404.
    NotFound,
    /// 412: an `If-Match` or `If-None-Match` condition did not hold.
    PreconditionFailed,
    /// 5xx.
    ServerError,
    /// Unexpected status or unreadable body.
    InvalidResponse,
    /// Bad URL, unbuildable client.
    ConfigurationError,
}

impl CalDavErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::PreconditionFailed => "precondition_failed",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for CalDavErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed CalDAV request.
#[derive(Debug, Error)]
pub struct CalDavError {
    code: CalDavErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CalDavError {
    pub fn new(code: CalDavErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::ConfigurationError, message)
    }

    /// Classifies a `reqwest` failure, keeping it as the source.
    pub fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            CalDavErrorCode::Timeout
        } else if err.is_builder() {
            CalDavErrorCode::ConfigurationError
        } else if err.is_decode() || err.is_body() {
            CalDavErrorCode::InvalidResponse
        } else {
            CalDavErrorCode::NetworkError
        };
        Self::new(code, format!("{}: {}", context, err)).with_source(err)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> CalDavErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for 412 responses.
    pub fn is_precondition_failed(&self) -> bool {
        self.code == CalDavErrorCode::PreconditionFailed
    }
}

impl fmt::Display for CalDavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type CalDavResult<T> = Result<T, CalDavError>;
