use crate::core::config::defaults;
use crate::transport::ChannelId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The `config.toml` record exactly as stored on disk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConfigFile {
    /// Chat platform credential. Only read at process start.
    pub bot_token: String,
    pub target_channel_id: ChannelId,
    pub chat_completions_endpoint: String,
    pub supported_models: Vec<String>,
    pub default_model: String,
    /// Seconds to wait for the completion API
    #[serde(default = "defaults::api_timeout")]
    pub api_timeout: u64,
    #[serde(default = "defaults::error_500_message")]
    pub error_500_message: String,
    /// Seconds to wait before retrying after a "500" reply
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay: u64,
    #[serde(default = "defaults::command_prefix")]
    pub command_prefix: String,
    #[serde(default = "defaults::max_message_length")]
    pub max_message_length: usize,
    /// Seconds to wait for an overwrite confirmation on save
    #[serde(default = "defaults::confirmation_timeout")]
    pub confirmation_timeout: u64,
}

/// Every reloadable setting, validated and converted to runtime types.
///
/// The bot credential is deliberately absent: it is fixed at startup and a
/// reload never touches it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub target_channel: ChannelId,
    pub endpoint_url: String,
    /// Listing order follows the file; membership is what matters.
    pub supported_models: Vec<String>,
    pub default_model: String,
    pub api_timeout: Duration,
    pub error_500_message: String,
    pub retry_delay: Duration,
    pub command_prefix: char,
    pub max_message_length: usize,
    pub confirmation_timeout: Duration,
}

impl RuntimeConfig {
    pub fn supports_model(&self, model: &str) -> bool {
        self.supported_models.iter().any(|m| m == model)
    }
}

impl ConfigFile {
    /// Checks the record and splits it into the startup-only credential and the
    /// reloadable runtime settings.
    pub fn into_runtime(self) -> Result<(String, RuntimeConfig), String> {
        let runtime = self.runtime()?;
        Ok((self.bot_token, runtime))
    }

    pub fn runtime(&self) -> Result<RuntimeConfig, String> {
        if self.supported_models.is_empty() {
            return Err("supported_models must list at least one model".to_string());
        }
        if !self.supported_models.contains(&self.default_model) {
            return Err(format!(
                "default_model '{}' is not in supported_models",
                self.default_model
            ));
        }
        if self.chat_completions_endpoint.trim().is_empty() {
            return Err("chat_completions_endpoint must not be empty".to_string());
        }
        let mut prefix_chars = self.command_prefix.chars();
        let command_prefix = match (prefix_chars.next(), prefix_chars.next()) {
            (Some(c), None) if !c.is_whitespace() => c,
            _ => {
                return Err(format!(
                    "command_prefix must be a single non-space character, got '{}'",
                    self.command_prefix
                ))
            }
        };
        if self.max_message_length == 0 {
            return Err("max_message_length must be greater than zero".to_string());
        }

        Ok(RuntimeConfig {
            target_channel: self.target_channel_id,
            endpoint_url: self.chat_completions_endpoint.trim().to_string(),
            supported_models: self.supported_models.clone(),
            default_model: self.default_model.clone(),
            api_timeout: defaults::secs(self.api_timeout),
            error_500_message: self.error_500_message.clone(),
            retry_delay: defaults::secs(self.retry_delay),
            command_prefix,
            max_message_length: self.max_message_length,
            confirmation_timeout: defaults::secs(self.confirmation_timeout),
        })
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
