// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # SpikeCore Neural Computation
//!
//! Point-neuron models for a discrete-time spiking simulator:
//! - **Types**: ids, time grid, events, errors
//! - **Buffers**: delivery-time indexed input ring buffers
//! - **Propagator**: exact exponential integration coefficients
//! - **Models**: `iaf_psc_exp`, `iaf_matco_2018`, `bpid_kp_2017`
//! - **Status**: key/value parameter and state protocol
//! - **Recording**: recordable tables and per-node data loggers
//!
//! The host owns scheduling, connection tables and event routing. Each node
//! is driven once per min-delay block through [`Node::update`] and never
//! shares mutable state with another node.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

pub mod buffers;
pub mod propagator;

pub mod models;

pub mod recording;
pub mod status;

// Re-export types
pub use types::{
    CurrentEvent, DataLoggingRequest, Error, NeuralError, NodeId, OutgoingSpike, Resolution,
    Result, Rport, SimulationContext, SpikeEvent, SpikeSink, Step,
};

pub use buffers::{MultiChannelBuffer, RingBuffer};
pub use models::{
    assert_update_range, BpidKp2017, IafMatco2018, IafPscExp, IntegrationType, Node, NodeLookup,
    PostsynapticView,
};
pub use propagator::{ExpPropagators, IntegrationScheme};
pub use recording::{DataLogger, LoggedSample, RecordablesMap};
pub use status::{StatusDict, StatusReader};
