//! Secret references in configuration values.
//!
//! A value may point outside the config file instead of holding the secret:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `pass::path/in/store` takes the first line of `pass show path/in/store`
//! - anything else is used verbatim

use std::process::Command;

use crate::error::{CliError, CliResult};

/// Where a configured value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Plain(&'a str),
    Env(&'a str),
    Pass(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else {
            Self::Plain(value)
        }
    }

    pub fn resolve(&self) -> CliResult<String> {
        match self {
            Self::Plain(value) => Ok((*value).to_string()),
            Self::Env(var) => std::env::var(var)
                .map_err(|_| CliError::Secret(format!("environment variable `{}` is not set", var))),
            Self::Pass(path) => pass_show(path),
        }
    }
}

/// Resolves `value`, following an `env::` or `pass::` reference.
pub fn resolve(value: &str) -> CliResult<String> {
    SecretRef::parse(value).resolve()
}

fn pass_show(path: &str) -> CliResult<String> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| CliError::Secret(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError::Secret(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| CliError::Secret(format!("`pass show {}` printed nothing", path)))
}
