// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Subscriber installation for host programs

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{parse_level, LogFormat, LoggingConfig};

/// Build the event filter: flagged crates at debug, everything else at `config.level`
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let level = parse_level(&config.level)?;
    let directives = debug_flags.to_filter_string(&level.to_string().to_lowercase());
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Install the global console subscriber
///
/// # Errors
/// Fails on an unknown level or if a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(debug_flags, config)?;

    let layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(config.with_target)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };

    Registry::default()
        .with(layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        "logging initialised (level={}, format={:?}, debug crates: {:?})",
        config.level,
        config.format,
        debug_flags.enabled_crates().collect::<Vec<_>>()
    );
    Ok(())
}

/// Initialize logging from process arguments, `SPIKECORE_DEBUG` and default settings
pub fn init_logging_default() -> Result<()> {
    init_logging(&crate::cli::parse_debug_flags(), &LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-spikecore-npu-neural".to_string()]);
        let filter = build_filter(&flags, &LoggingConfig::default()).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("spikecore_npu_neural=debug"));
    }

    #[test]
    fn test_build_filter_rejects_bad_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(build_filter(&CrateDebugFlags::default(), &config).is_err());
    }
}
