//! Client configuration loaded from environment variables.

use std::time::Duration;

use aivoice_core::poll_config::DEFAULT_MAX_CONSECUTIVE_ERRORS;

/// Default API base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout. Bounds each idle gap while a transfer is
/// running, and the whole of a status check.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Time allowed to establish a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the voice API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without trailing slash, e.g. `https://voice.example.com`.
    pub api_url: String,
    /// Bearer credential attached to every request.
    pub token: String,
    /// Longest silence tolerated on an upload or download, and the total
    /// budget of one status check. Large transfers may take longer than
    /// this overall as long as bytes keep flowing.
    pub request_timeout: Duration,
    /// Overrides the consecutive status-error ceiling of both job kinds.
    pub max_consecutive_errors: u32,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `AIVOICE_API_URL`                | `http://localhost:8000` |
    /// | `AIVOICE_TOKEN`                  | required                |
    /// | `AIVOICE_REQUEST_TIMEOUT_SECS`   | `60`                    |
    /// | `AIVOICE_MAX_CONSECUTIVE_ERRORS` | `5`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("AIVOICE_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.into())
            .trim()
            .trim_end_matches('/')
            .to_string();

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "AIVOICE_API_URL",
                value: api_url,
                reason: "must start with http:// or https://".into(),
            });
        }

        let token = lookup("AIVOICE_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("AIVOICE_TOKEN"))?;

        let timeout_secs = parse_or(
            &lookup,
            "AIVOICE_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let max_consecutive_errors = parse_or(
            &lookup,
            "AIVOICE_MAX_CONSECUTIVE_ERRORS",
            DEFAULT_MAX_CONSECUTIVE_ERRORS,
        )?;
        if max_consecutive_errors == 0 {
            return Err(ConfigError::Invalid {
                name: "AIVOICE_MAX_CONSECUTIVE_ERRORS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            api_url,
            token,
            request_timeout: Duration::from_secs(timeout_secs),
            max_consecutive_errors,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
