use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::auth;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file '{}': {source}", path.display())]
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    #[error("failed to parse config file '{}': {source}", path.display())]
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    /// Base URL of the robot's REST API, e.g. "http://192.168.1.20/api/v2"
    #[serde(default)]
    api_url: String,
    #[serde(default)]
    bot_token: String,
    /// Telegram usernames allowed to talk to the bot. The key must be present.
    authorized_users: Option<Vec<String>>,
    #[serde(default = "default_poll_timeout_secs")]
    poll_timeout_secs: u32,
    #[serde(default = "default_connection_attempts")]
    connection_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    retry_delay_secs: u64,
    /// Directory for the rolling log file. Stdout only when unset.
    log_dir: Option<String>,
}

fn default_poll_timeout_secs() -> u32 {
    60
}

fn default_connection_attempts() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    5
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub bot_token: String,
    pub authorized_users: Vec<String>,
    /// Long-poll timeout passed to getUpdates.
    pub poll_timeout: Duration,
    /// How many times to try reaching Telegram before giving up.
    pub connection_attempts: u32,
    pub retry_delay: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path, source: e })?;

        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        if file.api_url.trim().is_empty() {
            return Err(ConfigError::Validation("apiUrl is missing in config".into()));
        }
        if let Err(e) = reqwest::Url::parse(file.api_url.trim()) {
            return Err(ConfigError::Validation(format!("apiUrl is not a valid URL: {e}")));
        }
        if file.bot_token.is_empty() {
            return Err(ConfigError::Validation("botToken is missing in config".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let valid_token = file
            .bot_token
            .split_once(':')
            .is_some_and(|(id, secret)| id.parse::<u64>().is_ok() && !secret.is_empty());
        if !valid_token {
            return Err(ConfigError::Validation(
                "botToken appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }
        let Some(authorized_users) = file.authorized_users else {
            return Err(ConfigError::Validation("authorizedUsers are missing in config".into()));
        };
        if file.connection_attempts == 0 {
            return Err(ConfigError::Validation("connectionAttempts must be at least 1".into()));
        }

        Ok(Self {
            api_url: file.api_url.trim().trim_end_matches('/').to_string(),
            bot_token: file.bot_token,
            authorized_users: authorized_users
                .into_iter()
                .map(|u| u.trim().trim_start_matches('@').to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            poll_timeout: Duration::from_secs(u64::from(file.poll_timeout_secs)),
            connection_attempts: file.connection_attempts,
            retry_delay: Duration::from_secs(file.retry_delay_secs),
            log_dir: file.log_dir.map(PathBuf::from),
        })
    }

    pub fn is_authorized(&self, username: Option<&str>) -> bool {
        auth::is_authorized(username, &self.authorized_users)
    }
}
