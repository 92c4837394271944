// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bridges from loaded configuration to simulation objects
//!
//! ```rust
//! use spikecore::config::SpikeCoreConfig;
//! use spikecore::setup::{context_from_config, rng_from_config};
//!
//! let config = SpikeCoreConfig::default();
//! let ctx = context_from_config(&config.kernel)?;
//! assert_eq!(ctx.min_delay, 10);
//! let _rng = rng_from_config(&config.rng);
//! # Ok::<(), spikecore::SetupError>(())
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use spikecore_config::{ConfigError, KernelConfig, PlasticityConfig, RngConfig};
use spikecore_npu_neural::{NeuralError, Node, Resolution, SimulationContext, StatusDict};
use spikecore_npu_plasticity::{HistoryRetention, MatcoCommonProperties, UpdaterDevice};

/// Failures while turning configuration into simulation objects
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Neural(#[from] NeuralError),

    #[error("Observability setup failed: {0}")]
    Observability(String),
}

/// Simulation clock from the `[kernel]` section
///
/// Delays are rounded to whole steps of the resolution.
pub fn context_from_config(kernel: &KernelConfig) -> Result<SimulationContext, SetupError> {
    let resolution = Resolution::new(kernel.resolution_ms)?;
    let ctx = SimulationContext::new(
        resolution,
        resolution.ms_to_steps(kernel.min_delay_ms),
        resolution.ms_to_steps(kernel.max_delay_ms),
    )?;
    debug!(
        "[SETUP] h={}ms min_delay={} steps max_delay={} steps",
        resolution.ms(),
        ctx.min_delay,
        ctx.max_delay
    );
    Ok(ctx)
}

/// Seeded RNG for stochastic models
pub fn rng_from_config(rng: &RngConfig) -> StdRng {
    StdRng::seed_from_u64(rng.seed)
}

pub fn retention_from_config(plasticity: &PlasticityConfig) -> HistoryRetention {
    HistoryRetention::from_capacity(plasticity.history_capacity)
}

/// Common synapse properties; the updater is assigned later by node id
pub fn common_properties_from_config(plasticity: &PlasticityConfig) -> MatcoCommonProperties {
    let mut cp = MatcoCommonProperties::default();
    cp.learning_rate = plasticity.learning_rate;
    cp
}

pub fn updater_from_config(plasticity: &PlasticityConfig) -> Result<UpdaterDevice, SetupError> {
    let mut updater = UpdaterDevice::new();
    updater.set_status(
        &StatusDict::new().with("deliver_interval", plasticity.deliver_interval),
    )?;
    Ok(updater)
}

/// Install the global subscriber from the `[logging]` section
///
/// Crates listed in `debug_crates`, on the command line (`--debug-<crate>`)
/// or in `SPIKECORE_DEBUG` log at debug level.
#[cfg(feature = "observability")]
pub fn init_observability(logging: &spikecore_config::LoggingConfig) -> Result<(), SetupError> {
    use spikecore_observability::{init_logging, parse_debug_flags, LoggingConfig};

    let mut flags = parse_debug_flags();
    for crate_name in &logging.debug_crates {
        flags.enable(crate_name);
    }
    let config = LoggingConfig::from_names(&logging.level, &logging.format)
        .map_err(|e| SetupError::Observability(e.to_string()))?;
    init_logging(&flags, &config).map_err(|e| SetupError::Observability(format!("{e:#}")))
}
