//! CalDAV connection settings and resource URL layout.
//!
//! Resources live at fixed paths below the server base URL:
//!
//! - calendar home: `{base}/{principal}/`
//! - calendar: `{base}/{principal}/{calendar_id}/`
//! - event: `{base}/{principal}/{calendar_id}/{uid}.ics`

use std::time::Duration;
use url::Url;

/// Connection settings for a CalDAV server.
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Server base URL, e.g. `https://dav.example.com/calendars`.
    pub url: Url,

    /// Path of the principal's calendar home below `url`.
    pub principal: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Bound on every request; expiry is reported as a transport failure.
    pub timeout: Duration,

    pub user_agent: String,
}

impl CalDavConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for `principal` on the server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>, principal: impl Into<String>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url.as_ref())?;
        Ok(Self {
            url: parsed,
            principal: principal.into(),
            username: None,
            password: None,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calsync/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Disables TLS verification (self-hosted servers with private CAs).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the username and password when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    /// URL of the principal's calendar home collection.
    pub fn calendar_home_url(&self) -> String {
        let mut url = self.url.as_str().trim_end_matches('/').to_string();
        for segment in self.principal.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url.push('/');
        url
    }

    /// URL of a calendar collection.
    pub fn calendar_url(&self, calendar_id: &str) -> String {
        format!(
            "{}{}/",
            self.calendar_home_url(),
            urlencoding::encode(calendar_id)
        )
    }

    /// URL of the resource holding event `uid`.
    pub fn event_url(&self, calendar_id: &str, uid: &str) -> String {
        format!(
            "{}{}.ics",
            self.calendar_url(calendar_id),
            urlencoding::encode(uid)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CalDavConfig {
        CalDavConfig::new("https://dav.example.com/calendars/", "alice").unwrap()
    }

    #[test]
    fn defaults() {
        let config = config();
        assert!(config.verify_tls);
        assert!(config.credentials().is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("calsync/"));
    }

    #[test]
    fn builder_methods() {
        let config = config()
            .with_credentials("alice", "s3cret")
            .with_insecure_tls()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");

        assert_eq!(config.credentials(), Some(("alice", "s3cret")));
        assert!(!config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn resource_urls() {
        let config = config();
        assert_eq!(
            config.calendar_home_url(),
            "https://dav.example.com/calendars/alice/"
        );
        assert_eq!(
            config.calendar_url("work"),
            "https://dav.example.com/calendars/alice/work/"
        );
        assert_eq!(
            config.event_url("work", "abc@example.com"),
            "https://dav.example.com/calendars/alice/work/abc%40example.com.ics"
        );
    }

    #[test]
    fn nested_principal_keeps_its_slashes() {
        let config = CalDavConfig::new("https://dav.example.com", "/users/bob smith/").unwrap();
        assert_eq!(
            config.calendar_home_url(),
            "https://dav.example.com/users/bob%20smith/"
        );
    }

    #[test]
    fn invalid_url_returns_error() {
        assert!(CalDavConfig::new("not a valid url", "alice").is_err());
    }
}
