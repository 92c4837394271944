// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that kernel timing is consistent and that enumerated settings hold
//! one of their accepted values. All problems are collected and reported
//! together.

use crate::types::{LOG_FORMATS, LOG_LEVELS};
use crate::{ConfigError, ConfigResult, SpikeCoreConfig};

/// Relative slack when checking that delays are whole multiples of the resolution
const STEP_MULTIPLE_TOLERANCE: f64 = 1e-9;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    OutOfOrder { lower: String, upper: String },
    NotStepMultiple { field: String, value: f64, resolution: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be strictly positive", field, value)
            }
            Self::OutOfOrder { lower, upper } => {
                write!(f, "{} must not exceed {}", lower, upper)
            }
            Self::NotStepMultiple {
                field,
                value,
                resolution,
            } => write!(
                f,
                "{} = {} is not a multiple of the resolution {} ms",
                field, value, resolution
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Positive resolution
/// - Delay ordering (resolution <= min_delay <= max_delay)
/// - Delays that are whole numbers of steps
/// - Plasticity ranges and known logging settings
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &SpikeCoreConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_kernel(config, &mut errors);
    validate_plasticity(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_kernel(config: &SpikeCoreConfig, errors: &mut Vec<ConfigValidationError>) {
    let k = &config.kernel;
    if k.resolution_ms.is_nan() || k.resolution_ms <= 0.0 {
        errors.push(ConfigValidationError::NotPositive {
            field: "kernel.resolution_ms".to_string(),
            value: k.resolution_ms,
        });
        // remaining checks are relative to the resolution
        return;
    }
    if k.min_delay_ms < k.resolution_ms {
        errors.push(ConfigValidationError::OutOfOrder {
            lower: "kernel.resolution_ms".to_string(),
            upper: "kernel.min_delay_ms".to_string(),
        });
    }
    if k.max_delay_ms < k.min_delay_ms {
        errors.push(ConfigValidationError::OutOfOrder {
            lower: "kernel.min_delay_ms".to_string(),
            upper: "kernel.max_delay_ms".to_string(),
        });
    }
    for (field, value) in [
        ("kernel.min_delay_ms", k.min_delay_ms),
        ("kernel.max_delay_ms", k.max_delay_ms),
    ] {
        let steps = value / k.resolution_ms;
        if (steps - steps.round()).abs() > STEP_MULTIPLE_TOLERANCE * steps.abs().max(1.0) {
            errors.push(ConfigValidationError::NotStepMultiple {
                field: field.to_string(),
                value,
                resolution: k.resolution_ms,
            });
        }
    }
}

fn validate_plasticity(config: &SpikeCoreConfig, errors: &mut Vec<ConfigValidationError>) {
    let p = &config.plasticity;
    if p.deliver_interval < 1 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "plasticity.deliver_interval".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if !p.learning_rate.is_finite() || p.learning_rate < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "plasticity.learning_rate".to_string(),
            reason: "must be finite and non-negative".to_string(),
        });
    }
}

fn validate_logging(config: &SpikeCoreConfig, errors: &mut Vec<ConfigValidationError>) {
    let l = &config.logging;
    if !LOG_LEVELS.contains(&l.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
    if !LOG_FORMATS.contains(&l.format.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("must be one of {}", LOG_FORMATS.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &SpikeCoreConfig) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SpikeCoreConfig::default()).is_ok());
    }

    #[test]
    fn test_non_positive_resolution() {
        let mut config = SpikeCoreConfig::default();
        config.kernel.resolution_ms = 0.0;
        assert!(messages(&config).contains("kernel.resolution_ms"));
    }

    #[test]
    fn test_delay_ordering() {
        let mut config = SpikeCoreConfig::default();
        config.kernel.min_delay_ms = 5.0;
        config.kernel.max_delay_ms = 2.0;
        let msg = messages(&config);
        assert!(msg.contains("kernel.min_delay_ms must not exceed kernel.max_delay_ms"));
    }

    #[test]
    fn test_delay_must_be_whole_steps() {
        let mut config = SpikeCoreConfig::default();
        config.kernel.resolution_ms = 0.05;
        config.kernel.min_delay_ms = 1.05;
        assert!(validate_config(&config).is_ok());

        config.kernel.min_delay_ms = 1.04;
        assert!(messages(&config).contains("not a multiple"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SpikeCoreConfig::default();
        config.plasticity.deliver_interval = 0;
        config.logging.level = "verbose".to_string();
        config.logging.format = "xml".to_string();
        let msg = messages(&config);
        assert!(msg.contains("plasticity.deliver_interval"));
        assert!(msg.contains("logging.level"));
        assert!(msg.contains("logging.format"));
    }
}
