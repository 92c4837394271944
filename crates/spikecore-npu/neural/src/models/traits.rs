// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Node Capability Traits
//!
//! Every model (neurons and devices) is driven by the host through [`Node`].
//! The host keeps nodes as `Box<dyn Node>` and exposes them to synapses
//! through [`NodeLookup`], which hands out typed views such as
//! [`PostsynapticView`] instead of raw downcasts.
//!
//! ## Call order
//!
//! ```text
//! set_status*  ->  init_buffers  ->  calibrate  ->  { handle_* ; update(from, to) }*
//! ```
//!
//! All deliveries for a block are flushed into the node's buffers before the
//! `update` call that consumes them.

use ahash::AHashMap;
use rand::RngCore;

use crate::recording::LoggedSample;
use crate::status::StatusDict;
use crate::types::{
    CurrentEvent, DataLoggingRequest, NeuralError, NodeId, Result, Rport, SimulationContext,
    SpikeEvent, SpikeSink, Step,
};

/// What a plasticity rule may read from its postsynaptic neuron
pub trait PostsynapticView {
    /// Membrane potential in mV
    fn membrane_potential(&self) -> f64;

    /// Whether the neuron emitted a spike on its most recent step
    fn just_spiked(&self) -> bool;
}

/// A simulatable node owned by the host
pub trait Node: Send {
    /// Model name as used in error messages and status dictionaries
    fn model_name(&self) -> &'static str;

    fn node_id(&self) -> NodeId;

    fn set_node_id(&mut self, id: NodeId);

    /// Size and zero every input buffer and drop logged samples
    fn init_buffers(&mut self, ctx: &SimulationContext);

    /// Recompute cached coefficients from parameters and resolution
    fn calibrate(&mut self, ctx: &SimulationContext) -> Result<()>;

    /// Advance over steps `[from, to)` of the block starting at `ctx.slice_origin`
    fn update(
        &mut self,
        ctx: &SimulationContext,
        from: Step,
        to: Step,
        sink: &mut dyn SpikeSink,
        rng: &mut dyn RngCore,
    );

    /// Accept a spike into the buffer slot of its delivery step
    fn handle_spike(&mut self, ctx: &SimulationContext, event: &SpikeEvent);

    /// Accept a current injection. Nodes without current receptors ignore it.
    fn handle_current(&mut self, _ctx: &SimulationContext, _event: &CurrentEvent) {}

    /// Connection-time check that spikes may arrive on `receptor`
    fn handles_test_spike(&self, receptor: Rport) -> Result<Rport>;

    /// Connection-time check that currents may arrive on `receptor`
    fn handles_test_current(&self, receptor: Rport) -> Result<Rport> {
        Err(NeuralError::unknown_receptor(receptor, self.model_name()))
    }

    /// Attach a recording device; returns the port to pull data from
    fn connect_logging_device(&mut self, request: &DataLoggingRequest) -> Result<Rport>;

    /// Drain the samples recorded for a logging device
    fn handle_data_logging_request(&mut self, port: Rport) -> Result<Vec<LoggedSample>>;

    fn get_status(&self) -> StatusDict;

    /// Apply a status update. Either every entry is applied or none is.
    fn set_status(&mut self, status: &StatusDict) -> Result<()>;

    /// Typed view for plasticity rules, if this node exposes one
    fn as_postsynaptic(&self) -> Option<&dyn PostsynapticView> {
        None
    }

    /// Whether this node drives forced weight updates
    fn is_weight_updater(&self) -> bool {
        false
    }

    /// Drain the forced-update trigger times (ms) queued since the last call
    fn take_update_triggers(&mut self) -> Vec<f64> {
        Vec::new()
    }
}

/// Checks shared by every `update` implementation
#[inline]
pub fn assert_update_range(ctx: &SimulationContext, from: Step, to: Step) {
    assert!(to >= 0 && from < ctx.min_delay, "update range [{from}, {to}) outside min-delay block");
    assert!(from < to, "empty update range [{from}, {to})");
}

/// Host capability to resolve node ids
pub trait NodeLookup {
    fn node(&self, id: NodeId) -> Option<&dyn Node>;

    /// Resolve `id` to a neuron a plasticity rule can read
    fn postsynaptic(&self, id: NodeId) -> Result<&dyn PostsynapticView> {
        let node = self.node(id).ok_or(NeuralError::NodeNotFound(id))?;
        node.as_postsynaptic()
            .ok_or_else(|| NeuralError::IncompatibleTarget {
                node: id,
                model: node.model_name().to_string(),
                reason: "does not expose membrane potential and spike flag",
            })
    }
}

impl NodeLookup for AHashMap<NodeId, Box<dyn Node>> {
    fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.get(&id).map(|n| n.as_ref())
    }
}
