// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # SpikeCore Plasticity Module
//!
//! Connections between nodes and the plasticity rules that change them:
//! - Static forwarding connection (`KpConnection`)
//! - Rate-based LTP/LTD synapse (`MatcoSynapse`) driven by periodic forced
//!   updates rather than by spike arrival
//! - `UpdaterDevice`, the node that emits those periodic triggers
//!
//! ## Architecture
//! - Connections never hold references to nodes; targets are resolved by id
//!   through the host's [`NodeLookup`](spikecore_npu_neural::NodeLookup)
//! - Weight rules are pure functions in [`rate_rule`], synapse types only
//!   carry state and instrumentation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connection;
pub mod history;
pub mod matco_synapse;
pub mod rate_rule;
pub mod static_connection;
pub mod updater_device;

// Re-export key types
pub use connection::{Connection, ConnectionBase};
pub use history::{HistoryRetention, PlasticitySample, WeightHistory};
pub use matco_synapse::{force_update_all, MatcoCommonProperties, MatcoSynapse, RateSource};
pub use rate_rule::{classify, PlasticityRegime, RateRuleThresholds};
pub use static_connection::KpConnection;
pub use updater_device::UpdaterDevice;
