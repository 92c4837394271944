// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)
//!
//! Override values that fail to parse are ignored and the lower tier stays in
//! effect.

use crate::{ConfigError, ConfigResult, SpikeCoreConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "spikecore.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SPIKECORE_CONFIG_PATH";

/// Environment variable -> CLI override key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SPIKECORE_RESOLUTION_MS", "resolution_ms"),
    ("SPIKECORE_MIN_DELAY_MS", "min_delay_ms"),
    ("SPIKECORE_MAX_DELAY_MS", "max_delay_ms"),
    ("SPIKECORE_RNG_SEED", "seed"),
    ("SPIKECORE_LOG_LEVEL", "log_level"),
    ("SPIKECORE_LOG_FORMAT", "log_format"),
    ("SPIKECORE_DELIVER_INTERVAL", "deliver_interval"),
    ("SPIKECORE_HISTORY_CAPACITY", "history_capacity"),
    ("SPIKECORE_LEARNING_RATE", "learning_rate"),
];

/// Find the SpikeCore configuration file
///
/// Search order:
/// 1. `SPIKECORE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./spikecore.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "SpikeCore configuration file '{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML.
/// Value checks are separate, see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SpikeCoreConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SpikeCoreConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SPIKECORE_RESOLUTION_MS` -> `kernel.resolution_ms`
/// - `SPIKECORE_MIN_DELAY_MS` -> `kernel.min_delay_ms`
/// - `SPIKECORE_MAX_DELAY_MS` -> `kernel.max_delay_ms`
/// - `SPIKECORE_RNG_SEED` -> `rng.seed`
/// - `SPIKECORE_LOG_LEVEL` -> `logging.level`
/// - `SPIKECORE_LOG_FORMAT` -> `logging.format`
/// - `SPIKECORE_DELIVER_INTERVAL` -> `plasticity.deliver_interval`
/// - `SPIKECORE_HISTORY_CAPACITY` -> `plasticity.history_capacity` (`unbounded` clears it)
/// - `SPIKECORE_LEARNING_RATE` -> `plasticity.learning_rate`
pub fn apply_environment_overrides(config: &mut SpikeCoreConfig) {
    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            apply_override(config, key, &value);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys are the lower-case names listed for [`apply_environment_overrides`]
/// (e.g. `{"resolution_ms": "0.05", "seed": "7"}`). Unknown keys are ignored.
pub fn apply_cli_overrides(config: &mut SpikeCoreConfig, cli_args: &HashMap<String, String>) {
    for (key, value) in cli_args {
        apply_override(config, key, value);
    }
}

fn apply_override(config: &mut SpikeCoreConfig, key: &str, value: &str) {
    match key {
        "resolution_ms" => set_parsed(&mut config.kernel.resolution_ms, value),
        "min_delay_ms" => set_parsed(&mut config.kernel.min_delay_ms, value),
        "max_delay_ms" => set_parsed(&mut config.kernel.max_delay_ms, value),
        "seed" => set_parsed(&mut config.rng.seed, value),
        "log_level" => config.logging.level = value.to_lowercase(),
        "log_format" => config.logging.format = value.to_lowercase(),
        "deliver_interval" => set_parsed(&mut config.plasticity.deliver_interval, value),
        "history_capacity" => {
            if value.eq_ignore_ascii_case("unbounded") || value.eq_ignore_ascii_case("none") {
                config.plasticity.history_capacity = None;
            } else if let Ok(n) = value.parse::<usize>() {
                config.plasticity.history_capacity = Some(n);
            }
        }
        "learning_rate" => set_parsed(&mut config.plasticity.learning_rate, value),
        _ => {}
    }
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}
