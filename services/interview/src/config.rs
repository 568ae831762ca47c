//! Application Configuration Module
//!
//! Loads the interview service settings from environment variables (and a
//! local `.env` file during development) into a single shareable struct.

use secrecy::SecretString;
use std::env;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_FEEDBACK_API_URL: &str = "http://localhost:3000/api";

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub gateway_url: Option<String>,
    pub api_key: SecretString,
    pub workflow_id: Option<String>,
    pub assistant_id: Option<String>,
    pub feedback_api_url: String,
    pub feedback_api_key: Option<String>,
    pub question_advance_delay: Duration,
    pub feedback_display_delay: Duration,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid millisecond value for {var}: {value}")]
    InvalidDelay { var: String, value: String },
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `VOICE_API_KEY`: Secret key for the voice gateway. Required.
    // *   `VOICE_GATEWAY_URL`: (Optional) Gateway websocket base URL.
    // *   `VOICE_ASSISTANT_ID`: Assistant used for scripted interviews.
    // *   `VOICE_WORKFLOW_ID`: Workflow used for question generation.
    // *   `FEEDBACK_API_URL`: (Optional) Base URL of the feedback service.
    // *   `FEEDBACK_API_KEY`: (Optional) Bearer token for the feedback service.
    // *   `QUESTION_ADVANCE_DELAY_MS`: (Optional) Defaults to 1500.
    // *   `FEEDBACK_DISPLAY_DELAY_MS`: (Optional) Defaults to 2000.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("VOICE_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("VOICE_API_KEY".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gateway_url: lookup("VOICE_GATEWAY_URL"),
            api_key: SecretString::from(api_key),
            workflow_id: lookup("VOICE_WORKFLOW_ID"),
            assistant_id: lookup("VOICE_ASSISTANT_ID"),
            feedback_api_url: lookup("FEEDBACK_API_URL")
                .unwrap_or_else(|| DEFAULT_FEEDBACK_API_URL.to_string()),
            feedback_api_key: lookup("FEEDBACK_API_KEY"),
            question_advance_delay: delay(
                &lookup,
                "QUESTION_ADVANCE_DELAY_MS",
                interview_core::session::DEFAULT_QUESTION_ADVANCE_DELAY,
            )?,
            feedback_display_delay: delay(
                &lookup,
                "FEEDBACK_DISPLAY_DELAY_MS",
                interview_core::session::DEFAULT_FEEDBACK_DISPLAY_DELAY,
            )?,
            log_level,
        })
    }

    pub fn require_assistant_id(&self) -> Result<&str, ConfigError> {
        self.assistant_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("VOICE_ASSISTANT_ID".to_string()))
    }

    pub fn require_workflow_id(&self) -> Result<&str, ConfigError> {
        self.workflow_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("VOICE_WORKFLOW_ID".to_string()))
    }
}

fn delay(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDelay {
                var: var.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = Config::from_lookup(lookup(&[("VOICE_API_KEY", "secret")])).unwrap();

        assert_eq!(config.api_key.expose_secret(), "secret");
        assert_eq!(config.feedback_api_url, DEFAULT_FEEDBACK_API_URL);
        assert_eq!(config.question_advance_delay, Duration::from_millis(1500));
        assert_eq!(config.feedback_display_delay, Duration::from_millis(2000));
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.gateway_url.is_none());
        assert!(config.require_assistant_id().is_err());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "VOICE_API_KEY"));

        let err = Config::from_lookup(lookup(&[("VOICE_API_KEY", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("VOICE_API_KEY", "secret"),
            ("VOICE_ASSISTANT_ID", "asst-1"),
            ("VOICE_WORKFLOW_ID", "wf-1"),
            ("QUESTION_ADVANCE_DELAY_MS", "250"),
            ("FEEDBACK_DISPLAY_DELAY_MS", "0"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.require_assistant_id().unwrap(), "asst-1");
        assert_eq!(config.require_workflow_id().unwrap(), "wf-1");
        assert_eq!(config.question_advance_delay, Duration::from_millis(250));
        assert_eq!(config.feedback_display_delay, Duration::ZERO);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("VOICE_API_KEY", "secret"),
            ("QUESTION_ADVANCE_DELAY_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelay { var, .. } if var == "QUESTION_ADVANCE_DELAY_MS"));

        let err = Config::from_lookup(lookup(&[("VOICE_API_KEY", "secret"), ("RUST_LOG", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }
}
