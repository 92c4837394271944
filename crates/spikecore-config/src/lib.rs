// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # SpikeCore Configuration System
//!
//! Type-safe configuration loader for simulation hosts with support for:
//! - TOML file parsing (`spikecore.toml`)
//! - Environment variable overrides (`SPIKECORE_*`)
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spikecore_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Resolution: {} ms", config.kernel.resolution_ms);
//! println!("Min delay: {} ms", config.kernel.min_delay_ms);
//! ```
//!
//! Every section has defaults, so an empty file is a valid configuration.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: SpikeCoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.kernel.min_delay_ms, KernelConfig::default().min_delay_ms);
        assert_eq!(config.plasticity.deliver_interval, 1);
    }

    #[test]
    fn test_parse_error_maps_to_config_error() {
        let err: ConfigError = toml::from_str::<SpikeCoreConfig>("[kernel")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
