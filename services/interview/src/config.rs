//! Application Configuration Module
//!
//! Centralizes the configuration for the interview service. Settings are
//! read from environment variables (a `.env` file is honored for local
//! development) into a single struct that is handed to the runtime at
//! startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";
pub const DEFAULT_DURATION_SECS: u64 = 600;
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 170;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where spoken answers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceInput {
    /// Lines typed while the simulated microphone is armed count as speech.
    Console,
    /// No speech capability; every answer is typed.
    Off,
}

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub session_duration: Duration,
    pub prompts_dir: PathBuf,
    pub voice_input: VoiceInput,
    pub words_per_minute: u32,
    pub request_timeout: Duration,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `INTERVIEW_API_BASE`: Base URL of the interview backend. Defaults to "http://127.0.0.1:3000".
    // *   `INTERVIEW_DURATION_SECS`: Length of a session. Defaults to 600.
    // *   `PROMPTS_DIR`: Directory with `system_prompt.md` / `evaluation_rubric.md`. Defaults to "prompts".
    // *   `VOICE_INPUT`: "console" or "off". Defaults to "console".
    // *   `SPEECH_WORDS_PER_MINUTE`: Simulated speaking rate. Defaults to 170.
    // *   `REQUEST_TIMEOUT_SECS`: Timeout for backend calls. Defaults to 30.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup("INTERVIEW_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let duration_secs: u64 =
            parse_positive(&lookup, "INTERVIEW_DURATION_SECS", DEFAULT_DURATION_SECS)?;
        let timeout_secs: u64 =
            parse_positive(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let words_per_minute: u32 =
            parse_positive(&lookup, "SPEECH_WORDS_PER_MINUTE", DEFAULT_WORDS_PER_MINUTE)?;

        let prompts_dir = lookup("PROMPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR));

        let voice_input = match lookup("VOICE_INPUT") {
            None => VoiceInput::Console,
            Some(value) => match value.to_lowercase().as_str() {
                "console" => VoiceInput::Console,
                "off" | "none" => VoiceInput::Off,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "VOICE_INPUT",
                        value,
                    });
                }
            },
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            api_base,
            session_duration: Duration::from_secs(duration_secs),
            prompts_dir,
            voice_input,
            words_per_minute,
            request_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    pub fn interview_endpoint(&self) -> String {
        format!("{}/api/interview", self.api_base)
    }

    pub fn evaluate_endpoint(&self) -> String {
        format!("{}/api/evaluate", self.api_base)
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { var, value }),
    }
}
