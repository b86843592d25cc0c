//! TLink Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults matching the trained models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TlinkConfig {
    /// Feature extraction settings
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl TlinkConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TLINK_TIMEX_RESOURCE") {
            config.extractor.timex_resource = PathBuf::from(path);
        }
        if let Ok(value) = std::env::var("TLINK_DOC_TIME_WINDOW") {
            config.extractor.doc_time_window = parse_var("TLINK_DOC_TIME_WINDOW", &value)?;
        }
        if let Ok(value) = std::env::var("TLINK_EVENT_TIME_WINDOW") {
            config.extractor.event_time_window = parse_var("TLINK_EVENT_TIME_WINDOW", &value)?;
        }
        if let Ok(token) = std::env::var("TLINK_OOV_TOKEN") {
            config.extractor.oov_token = token;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(value) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_var("LOG_JSON", &value)?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = ExtractorConfig::default();

        // Only override if env values differ from defaults
        if env_config.extractor.timex_resource != defaults.timex_resource {
            self.extractor.timex_resource = env_config.extractor.timex_resource;
        }
        if env_config.extractor.doc_time_window != defaults.doc_time_window {
            self.extractor.doc_time_window = env_config.extractor.doc_time_window;
        }
        if env_config.extractor.event_time_window != defaults.event_time_window {
            self.extractor.event_time_window = env_config.extractor.event_time_window;
        }
        if env_config.extractor.oov_token != defaults.oov_token {
            self.extractor.oov_token = env_config.extractor.oov_token;
        }
        if env_config.logging != LoggingConfig::default() {
            self.logging = env_config.logging;
        }

        Ok(self)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Feature extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tokens on each side of an event for DocTimeRel features
    pub doc_time_window: usize,

    /// Tokens before the left and after the right argument of an event-time pair
    pub event_time_window: usize,

    /// Timex normalization table (`<text>|<index>` per line)
    pub timex_resource: PathBuf,

    /// Token used for time expressions missing from the table
    pub oov_token: String,

    /// Outcome for candidate pairs without a gold relation
    pub no_relation_category: String,

    /// Chunk type used in BIO labels for time expressions
    pub time_label: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            doc_time_window: 40,
            event_time_window: 2,
            timex_resource: PathBuf::from("resources/timex_idx.txt"),
            oov_token: "<timex_797>".to_string(),
            no_relation_category: "none".to_string(),
            time_label: "TIME".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
