// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Rate-adapting Integrate-and-Fire Neuron
//!
//! ## Model Dynamics
//!
//! ```text
//! per step:
//!     input = spikes_ex - spikes_in + I_e + I_0 + I_1
//!     V_m  += (-V_m + k1 * input) / tau_syn_ex
//!     phi   = (V_m - alpha * omega) > theta
//!     omega += (-omega + phi) / tau
//! ```
//!
//! `omega` is an exponential trace of the neuron's own firing, so a neuron
//! that has fired recently needs a larger membrane potential to fire again.
//! `phi` stays readable after the step and is what plasticity rules see as
//! "just spiked".
//!
//! All four input lanes live in one [`MultiChannelBuffer`] and the whole slot
//! is cleared after it has been consumed.

use rand::RngCore;
use tracing::{debug, trace};

use super::traits::{assert_update_range, Node, PostsynapticView};
use crate::buffers::MultiChannelBuffer;
use crate::recording::{DataLogger, LoggedSample, Recordable, RecordablesMap};
use crate::status::{StatusDict, StatusReader};
use crate::types::{
    CurrentEvent, DataLoggingRequest, NeuralError, NodeId, OutgoingSpike, Result, Rport,
    SimulationContext, SpikeEvent, SpikeSink, Step,
};

pub const MODEL_NAME: &str = "iaf_matco_2018";

/// Input lanes
const SYN_EX: usize = 0;
const SYN_IN: usize = 1;
const I0: usize = 2;
const I1: usize = 3;
const LANES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct IafMatcoParameters {
    /// Time constant of the firing-rate trace (ms)
    pub tau: f64,
    /// Input gain
    pub k1: f64,
    /// Constant external input
    pub i_e: f64,
    /// Firing threshold
    pub theta: f64,
    /// Membrane integration time constant (ms)
    pub tau_syn_ex: f64,
    pub tau_syn_in: f64,
    /// Weight of the firing-rate trace on the threshold test
    pub alpha: f64,
}

impl Default for IafMatcoParameters {
    fn default() -> Self {
        Self {
            tau: 10.0,
            k1: 0.01,
            i_e: 0.0,
            theta: 0.18,
            tau_syn_ex: 2.5,
            tau_syn_in: 5.0,
            alpha: 7.0,
        }
    }
}

impl IafMatcoParameters {
    fn write(&self, d: &mut StatusDict) {
        d.insert("Tau", self.tau);
        d.insert("k1", self.k1);
        d.insert("I_e", self.i_e);
        d.insert("theta", self.theta);
        d.insert("tau_syn_ex", self.tau_syn_ex);
        d.insert("tau_syn_in", self.tau_syn_in);
        d.insert("alpha", self.alpha);
    }

    fn read(&mut self, r: &mut StatusReader<'_>) -> Result<()> {
        r.update_f64("Tau", &mut self.tau)?;
        r.update_f64("k1", &mut self.k1)?;
        r.update_f64("I_e", &mut self.i_e)?;
        r.update_f64("theta", &mut self.theta)?;
        r.update_f64("tau_syn_ex", &mut self.tau_syn_ex)?;
        r.update_f64("tau_syn_in", &mut self.tau_syn_in)?;
        r.update_f64("alpha", &mut self.alpha)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tau <= 0.0 || self.tau_syn_ex <= 0.0 || self.tau_syn_in <= 0.0 {
            return Err(NeuralError::BadProperty(
                "Membrane and synapse time constants must be strictly positive.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IafMatcoState {
    pub v_m: f64,
    /// Firing-rate trace
    pub omega: f64,
    /// Spiked on the most recent step
    pub phi: bool,
    /// Excitatory input consumed on the most recent step
    pub i_syn_ex: f64,
    /// Inhibitory input magnitude consumed on the most recent step
    pub i_syn_in: f64,
}

impl IafMatcoState {
    fn write(&self, d: &mut StatusDict) {
        d.insert("V_m", self.v_m);
        d.insert("omega", self.omega);
        d.insert("phi", self.phi);
    }

    fn read(&mut self, r: &mut StatusReader<'_>) -> Result<()> {
        r.update_f64("V_m", &mut self.v_m)?;
        r.update_f64("omega", &mut self.omega)?;
        r.update_bool("phi", &mut self.phi)?;
        Ok(())
    }
}

fn rec_v_m(_: &IafMatcoParameters, s: &IafMatcoState) -> f64 {
    s.v_m
}
fn rec_i_syn_ex(_: &IafMatcoParameters, s: &IafMatcoState) -> f64 {
    s.i_syn_ex
}
fn rec_i_syn_in(_: &IafMatcoParameters, s: &IafMatcoState) -> f64 {
    s.i_syn_in
}
fn rec_omega(_: &IafMatcoParameters, s: &IafMatcoState) -> f64 {
    s.omega
}

static RECORDABLES: RecordablesMap<IafMatcoParameters, IafMatcoState> = RecordablesMap::new(&[
    Recordable {
        name: "V_m",
        accessor: rec_v_m,
    },
    Recordable {
        name: "I_syn_ex",
        accessor: rec_i_syn_ex,
    },
    Recordable {
        name: "I_syn_in",
        accessor: rec_i_syn_in,
    },
    Recordable {
        name: "omega",
        accessor: rec_omega,
    },
]);

#[derive(Debug, Clone, Default)]
pub struct IafMatco2018 {
    id: NodeId,
    params: IafMatcoParameters,
    state: IafMatcoState,
    input: MultiChannelBuffer<LANES>,
    logger: DataLogger<IafMatcoParameters, IafMatcoState>,
    last_spike: Option<Step>,
    calibrated: bool,
}

impl IafMatco2018 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: IafMatcoParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    pub fn parameters(&self) -> &IafMatcoParameters {
        &self.params
    }

    pub fn state(&self) -> &IafMatcoState {
        &self.state
    }

    pub fn last_spike(&self) -> Option<Step> {
        self.last_spike
    }
}

impl PostsynapticView for IafMatco2018 {
    fn membrane_potential(&self) -> f64 {
        self.state.v_m
    }

    fn just_spiked(&self) -> bool {
        self.state.phi
    }
}

impl Node for IafMatco2018 {
    fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    fn node_id(&self) -> NodeId {
        self.id
    }

    fn set_node_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn init_buffers(&mut self, ctx: &SimulationContext) {
        self.input.resize(ctx.buffer_len());
        self.logger.reset();
        self.last_spike = None;
    }

    fn calibrate(&mut self, _ctx: &SimulationContext) -> Result<()> {
        self.params.validate()?;
        self.calibrated = true;
        debug!("[{}] node {} calibrated: {:?}", MODEL_NAME, self.id, self.params);
        Ok(())
    }

    fn update(
        &mut self,
        ctx: &SimulationContext,
        from: Step,
        to: Step,
        sink: &mut dyn SpikeSink,
        _rng: &mut dyn RngCore,
    ) {
        assert_update_range(ctx, from, to);
        assert!(self.calibrated, "{MODEL_NAME} updated before calibrate");

        let p = &self.params;
        for lag in from..to {
            let slot = ctx.slot_for_lag(lag);
            let lanes = self.input.get_values_all_channels(slot);
            let s = &mut self.state;

            s.i_syn_ex = lanes[SYN_EX];
            s.i_syn_in = lanes[SYN_IN];
            let input = lanes[SYN_EX] - lanes[SYN_IN] + p.i_e + lanes[I0] + lanes[I1];
            s.v_m += (-s.v_m + p.k1 * input) / p.tau_syn_ex;

            s.phi = s.v_m - p.alpha * s.omega > p.theta;
            if s.phi {
                let stamp = ctx.slice_origin + lag + 1;
                self.last_spike = Some(stamp);
                trace!("[{}] node {} spiked at step {}", MODEL_NAME, self.id, stamp);
                sink.send(OutgoingSpike {
                    sender: self.id,
                    lag,
                    stamp,
                });
            }
            s.omega += (-s.omega + f64::from(u8::from(s.phi))) / p.tau;

            self.input.reset_values_all_channels(slot);
            self.logger
                .record_data(ctx.slice_origin + lag + 1, &self.params, &self.state);
        }
    }

    fn handle_spike(&mut self, ctx: &SimulationContext, event: &SpikeEvent) {
        assert!(event.delay_steps > 0);
        let slot = ctx.slot(event.delivery_step());
        if event.weight > 0.0 {
            self.input.add_value(slot, SYN_EX, event.weighted());
        } else {
            self.input.add_value(slot, SYN_IN, -event.weighted());
        }
    }

    fn handle_current(&mut self, ctx: &SimulationContext, event: &CurrentEvent) {
        assert!(event.delay_steps > 0);
        let slot = ctx.slot(event.delivery_step());
        let amplitude = event.weight * event.current;
        match event.rport {
            0 => self.input.add_value(slot, I0, amplitude),
            1 => self.input.add_value(slot, I1, amplitude),
            _ => {}
        }
    }

    fn handles_test_spike(&self, receptor: Rport) -> Result<Rport> {
        if receptor != 0 {
            return Err(NeuralError::unknown_receptor(receptor, MODEL_NAME));
        }
        Ok(0)
    }

    fn handles_test_current(&self, receptor: Rport) -> Result<Rport> {
        match receptor {
            0 | 1 => Ok(receptor),
            _ => Err(NeuralError::unknown_receptor(receptor, MODEL_NAME)),
        }
    }

    fn connect_logging_device(&mut self, request: &DataLoggingRequest) -> Result<Rport> {
        self.logger.connect(request, &RECORDABLES, MODEL_NAME)
    }

    fn handle_data_logging_request(&mut self, port: Rport) -> Result<Vec<LoggedSample>> {
        self.logger.take_data(port)
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        self.params.write(&mut d);
        self.state.write(&mut d);
        d.insert("recordables", RECORDABLES.names());
        d.insert("model", MODEL_NAME);
        d.insert("t_spike", self.last_spike.map_or(-1.0, |s| s as f64));
        d
    }

    fn set_status(&mut self, status: &StatusDict) -> Result<()> {
        let mut r = status.reader();
        let mut params = self.params.clone();
        params.read(&mut r)?;
        params.validate()?;
        let mut state = self.state.clone();
        state.read(&mut r)?;
        r.skip_read_only(&["recordables", "model", "t_spike"]);
        r.finish(MODEL_NAME)?;

        self.params = params;
        self.state = state;
        self.calibrated = false;
        Ok(())
    }

    fn as_postsynaptic(&self) -> Option<&dyn PostsynapticView> {
        Some(self)
    }
}
