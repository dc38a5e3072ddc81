use std::net::SocketAddr;
use tracing::Level;

pub const DEFAULT_CHAT_API_BASE: &str = "https://api.together.xyz/v1";
pub const DEFAULT_CHAT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub chat_api_base: String,
    pub chat_api_key: String,
    pub chat_model: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This function will look for a `.env` file in the current directory
    /// and load the following variables:
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to. Defaults to "0.0.0.0:3000".
    /// *   `CHAT_API_BASE`: Base URL of an OpenAI-compatible chat completions API. Defaults to Together.
    /// *   `CHAT_API_KEY`: Secret key for that API. Required.
    /// *   `CHAT_MODEL`: (Optional) Model name. Defaults to Mixtral 8x7B Instruct.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let chat_api_base = lookup("CHAT_API_BASE")
            .unwrap_or_else(|| DEFAULT_CHAT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let chat_api_key = lookup("CHAT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("CHAT_API_KEY".to_string()))?;

        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            chat_api_base,
            chat_api_key,
            chat_model,
            log_level,
        })
    }
}
