// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neural Types Module
//!
//! Core type definitions shared by buffers, models and synapses.

pub mod error;
pub mod events;
pub mod ids;
pub mod time;

// Re-export commonly used types
pub use error::{Error, NeuralError, Result};
pub use events::{CurrentEvent, DataLoggingRequest, OutgoingSpike, SpikeEvent, SpikeSink};
pub use ids::{NodeId, Rport, Step};
pub use time::{Resolution, SimulationContext};
