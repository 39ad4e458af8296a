// Application configuration, loaded from the environment at startup

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {key} is required")]
    Missing { key: &'static str },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Server-side settings shared by the API and the CLI
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
        })
    }
}

/// Remote judge connection settings
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    /// Number of result fetches before a pending job is reported as-is
    pub poll_attempts: u32,
    /// Wait before the first fetch; doubles between further fetches
    pub poll_delay: Duration,
    pub request_timeout: Duration,
}

impl JudgeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            api_host: None,
            poll_attempts: 1,
            poll_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("JUDGE0_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing { key: "JUDGE0_API_URL" })?;

        let poll_attempts: u32 = try_load("JUDGE_POLL_ATTEMPTS", "1")?;
        if poll_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "JUDGE_POLL_ATTEMPTS",
                message: "must be at least 1".to_string(),
            });
        }

        let mut config = Self::new(base_url);
        config.api_key = optional("JUDGE0_API_KEY");
        config.api_host = optional("JUDGE0_API_HOST");
        config.poll_attempts = poll_attempts;
        config.poll_delay = Duration::from_millis(try_load("JUDGE_POLL_DELAY_MS", "1000")?);
        config.request_timeout =
            Duration::from_millis(try_load("JUDGE_REQUEST_TIMEOUT_MS", "10000")?);
        Ok(config)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            message: e.to_string(),
        }
    })
}
