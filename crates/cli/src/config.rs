//! Shell configuration from environment variables.

use thiserror::Error;

use filevault_observability::LogFormat;

pub const ENV_LOG_FORMAT: &str = "FILEVAULT_LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "FILEVAULT_LOG";
pub const ENV_PROMPT: &str = "FILEVAULT_PROMPT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Print the command prompt before reading each line.
    pub show_prompt: bool,
    pub log_format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            show_prompt: true,
            log_format: LogFormat::Pretty,
            log_filter: "warn".to_string(),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_PROMPT) {
            config.show_prompt = parse_flag(&value).ok_or(ConfigError {
                key: ENV_PROMPT,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            config.log_format = value.parse().map_err(|_| ConfigError {
                key: ENV_LOG_FORMAT,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG_FILTER) {
            if !value.trim().is_empty() {
                config.log_filter = value;
            }
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
