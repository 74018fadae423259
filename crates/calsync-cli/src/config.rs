//! CLI configuration.
//!
//! Settings live in `~/.config/calsync/config.toml` by default:
//!
//! ```toml
//! [server]
//! url = "https://dav.example.com/calendars"
//! principal = "alice"
//! username = "alice"
//! password = "env::CALSYNC_PASSWORD"
//!
//! [defaults]
//! calendar = "work"
//! ```
//!
//! The password accepts `env::` and `pass::` references (see [`crate::secret`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use calsync_caldav::CalDavConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};
use crate::secret;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub defaults: Defaults,
}

/// Connection to the CalDAV server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL below which principals' calendar homes live.
    pub url: Option<String>,
    pub principal: Option<String>,
    pub username: Option<String>,
    /// Plain text or a secret reference.
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
    pub verify_tls: bool,
    /// Replaces the default `calsync/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            principal: None,
            username: None,
            password: None,
            timeout: CalDavConfig::DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
            user_agent: None,
        }
    }
}

/// Values used when a command-line flag is omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub calendar: Option<String>,
    /// Length of the `events` window when `--to` is not given.
    pub window_days: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            calendar: None,
            window_days: 30,
        }
    }
}

impl Config {
    /// Loads the default file, or built-in defaults if it does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calsync")
            .join("config.toml")
    }

    /// Picks the calendar from the flag or the configured default.
    pub fn calendar(&self, flag: Option<String>) -> CliResult<String> {
        flag.or_else(|| self.defaults.calendar.clone()).ok_or_else(|| {
            CliError::InvalidArgument(
                "no calendar given; pass --calendar or set [defaults] calendar".to_string(),
            )
        })
    }

    /// Builds the transport configuration, resolving the password reference.
    pub fn to_caldav_config(&self) -> CliResult<CalDavConfig> {
        let server = &self.server;
        let url = server.url.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "[server] url is missing from {}",
                Self::default_path().display()
            ))
        })?;
        let principal = server
            .principal
            .as_deref()
            .or(server.username.as_deref())
            .ok_or_else(|| CliError::Config("[server] principal is missing".to_string()))?;

        let mut config = CalDavConfig::new(url, principal)
            .map_err(|e| CliError::Config(format!("invalid server url {:?}: {}", url, e)))?
            .with_timeout(Duration::from_secs(server.timeout));

        match (&server.username, &server.password) {
            (Some(username), Some(password)) => {
                config = config.with_credentials(username, secret::resolve(password)?);
            }
            (None, Some(_)) => {
                return Err(CliError::Config(
                    "[server] password is set without a username".to_string(),
                ));
            }
            _ => {}
        }
        if !server.verify_tls {
            config = config.with_insecure_tls();
        }
        if let Some(ref user_agent) = server.user_agent {
            config = config.with_user_agent(user_agent);
        }

        Ok(config)
    }
}
