// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `spikecore.toml`. Missing sections and
//! keys fall back to the `Default` impls below.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikeCoreConfig {
    pub kernel: KernelConfig,
    pub rng: RngConfig,
    pub plasticity: PlasticityConfig,
    pub logging: LoggingConfig,
}

/// Simulation clock and delay bounds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Step size h (ms)
    pub resolution_ms: f64,
    /// Smallest connection delay (ms); one update block spans this long
    pub min_delay_ms: f64,
    /// Largest connection delay (ms)
    pub max_delay_ms: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            min_delay_ms: 1.0,
            max_delay_ms: 10.0,
        }
    }
}

/// Random number generation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RngConfig {
    /// Seed for the host RNG handed to stochastic models
    pub seed: u64,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Plasticity synapses and the updater device
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlasticityConfig {
    /// Updater trigger period in min-delay blocks
    pub deliver_interval: i64,
    /// Samples kept per synapse history; absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_capacity: Option<usize>,
    pub learning_rate: f64,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            deliver_interval: 1,
            history_capacity: None,
            learning_rate: 0.0008,
        }
    }
}

/// Log output settings consumed by `spikecore-observability`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// "text" or "json"
    pub format: String,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            debug_crates: Vec::new(),
        }
    }
}

/// Levels accepted by `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Formats accepted by `logging.format`
pub const LOG_FORMATS: &[&str] = &["text", "json"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: SpikeCoreConfig = toml::from_str(
            r#"
            [kernel]
            resolution_ms = 0.05

            [plasticity]
            history_capacity = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.kernel.resolution_ms, 0.05);
        assert_eq!(config.kernel.max_delay_ms, 10.0);
        assert_eq!(config.plasticity.history_capacity, Some(500));
        assert_eq!(config.plasticity.learning_rate, 0.0008);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(SpikeCoreConfig::default()).unwrap();
        assert_eq!(json["rng"]["seed"], 42);
        assert!(json["plasticity"].get("history_capacity").is_none());
    }
}
