// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Observability configuration types

use serde::{Deserialize, Serialize};

/// Errors raised while interpreting logging settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Unknown log level '{0}' (expected trace, debug, info, warn or error)")]
    InvalidLevel(String),

    #[error("Unknown log format '{0}' (expected text or json)")]
    InvalidFormat(String),
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Result<Self, ObservabilityError> {
        match name.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ObservabilityError::InvalidFormat(name.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for crates without a debug flag
    pub level: String,

    pub format: LogFormat,

    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Build from the string settings of a `[logging]` config section
    pub fn from_names(level: &str, format: &str) -> Result<Self, ObservabilityError> {
        Ok(LoggingConfig {
            level: parse_level(level)?.to_string().to_lowercase(),
            format: LogFormat::from_name(format)?,
            ..Default::default()
        })
    }
}

/// Parse a level name, case-insensitive
pub fn parse_level(level: &str) -> Result<tracing::Level, ObservabilityError> {
    level
        .trim()
        .parse::<tracing::Level>()
        .map_err(|_| ObservabilityError::InvalidLevel(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let config = LoggingConfig::from_names("WARN", "Json").unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_settings() {
        assert_eq!(
            LoggingConfig::from_names("verbose", "text").unwrap_err(),
            ObservabilityError::InvalidLevel("verbose".to_string())
        );
        assert!(matches!(
            LoggingConfig::from_names("info", "xml"),
            Err(ObservabilityError::InvalidFormat(_))
        ));
    }
}
