// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # SpikeCore
//!
//! Point-neuron and synapse models for discrete-time spiking network
//! simulators. The host owns the network and the clock; this crate provides
//! the models it drives.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! spikecore = "0.1"
//! ```
//!
//! ```rust
//! use spikecore::prelude::*;
//!
//! let mut ctx = SimulationContext::default();
//! let mut neuron = IafPscExp::new();
//! neuron.set_status(&StatusDict::new().with("I_e", 1000.0))?;
//! neuron.init_buffers(&ctx);
//! neuron.calibrate(&ctx)?;
//!
//! let mut rng = rand::rngs::mock::StepRng::new(0, 1);
//! let mut spikes: Vec<OutgoingSpike> = Vec::new();
//! for _ in 0..10 {
//!     neuron.update(&ctx, 0, ctx.min_delay, &mut spikes, &mut rng);
//!     ctx.advance_slice();
//! }
//! assert!(!spikes.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  spikecore-config         spikecore-observability       │
//! │  (spikecore.toml)         (tracing subscriber)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓ setup
//! ┌─────────────────────────────────────────────────────────┐
//! │  spikecore-npu-neural                                   │
//! │  (buffers, propagators, neuron models, status, Node)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  spikecore-npu-plasticity                               │
//! │  (connections, rate-based plasticity, updater device)   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//!
//! - **`observability`** (default): [`setup::init_observability`] installs a
//!   `tracing` subscriber. Without it the crate only emits events.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use spikecore_config as config;
pub use spikecore_npu_neural as neural;
pub use spikecore_npu_plasticity as plasticity;

#[cfg(feature = "observability")]
pub use spikecore_observability as observability;

pub mod setup;

pub use setup::SetupError;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::neural::{
        BpidKp2017, CurrentEvent, DataLoggingRequest, IafMatco2018, IafPscExp, IntegrationType,
        NeuralError, Node, NodeId, NodeLookup, OutgoingSpike, PostsynapticView, Resolution,
        SimulationContext, SpikeEvent, SpikeSink, StatusDict, Step,
    };
    pub use crate::plasticity::{
        force_update_all, Connection, ConnectionBase, HistoryRetention, KpConnection,
        MatcoCommonProperties, MatcoSynapse, PlasticityRegime, RateSource, UpdaterDevice,
    };
    pub use crate::setup::{
        common_properties_from_config, context_from_config, retention_from_config,
        rng_from_config, updater_from_config,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _id = NodeId(0);
        let _ctx = SimulationContext::default();
        assert!(!crate::VERSION.is_empty());
    }
}
