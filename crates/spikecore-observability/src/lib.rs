// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikecore-observability
//!
//! Logging setup for programs that host SpikeCore models.
//!
//! Library crates in the workspace only emit `tracing` events. Installing a
//! subscriber is left to the host, which can call [`init_logging`] with
//! per-crate debug flags parsed from `--debug-<crate>` arguments or the
//! `SPIKECORE_DEBUG` environment variable.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known SpikeCore crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spikecore",
    "spikecore-config",
    "spikecore-npu-neural",
    "spikecore-npu-plasticity",
    "spikecore-observability",
];

/// Tracing target for a crate name (`-` becomes `_`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
