// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Current-based LIF with Exponential Synaptic Currents
//!
//! ## Model Dynamics
//!
//! ```text
//! dV/dt     = -(V - E_L)/tau_m + (I_syn_ex + I_syn_in + I_e + I_0)/C_m
//! dI_ex/dt  = -I_ex/tau_syn_ex
//! dI_in/dt  = -I_in/tau_syn_in
//! ```
//!
//! integrated exactly on the grid with cached propagators:
//!
//! ```text
//! per step (V relative to E_L):
//!     if not refractory:  V = P22*V + P21ex*I_ex + P21in*I_in + P20*(I_e + I_0)
//!     else:               refractory_counter -= 1
//!     I_ex = P11ex*I_ex + (1 - P11ex)*I_1 + spikes_ex
//!     I_in = P11in*I_in + spikes_in
//!     if V >= V_th:       V = V_reset, refractory_counter = round(t_ref/h), emit spike
//!     I_0, I_1 = current lanes of this step
//! ```
//!
//! Spikes with positive weight land in the excitatory buffer, all others in
//! the inhibitory buffer (keeping their sign). Current receptor 0 enters the
//! membrane directly, receptor 1 is low-pass filtered through `tau_syn_ex`.

use rand::RngCore;
use tracing::{debug, trace};

use super::traits::{assert_update_range, Node};
use crate::buffers::{MultiChannelBuffer, RingBuffer};
use crate::propagator::{ExpPropagators, IntegrationScheme};
use crate::recording::{DataLogger, LoggedSample, Recordable, RecordablesMap};
use crate::status::{StatusDict, StatusReader};
use crate::types::{
    CurrentEvent, DataLoggingRequest, NeuralError, NodeId, OutgoingSpike, Result, Rport,
    SimulationContext, SpikeEvent, SpikeSink, Step,
};

pub const MODEL_NAME: &str = "iaf_psc_exp";

/// Current lanes of the input buffer
const I0: usize = 0;
const I1: usize = 1;

/// Model parameters. Voltages other than `e_l` are stored relative to `e_l`.
#[derive(Debug, Clone, PartialEq)]
pub struct IafPscExpParameters {
    /// Resting potential (mV)
    pub e_l: f64,
    /// Membrane capacitance (pF)
    pub c_m: f64,
    /// Membrane time constant (ms)
    pub tau_m: f64,
    pub tau_syn_ex: f64,
    pub tau_syn_in: f64,
    /// Absolute refractory period (ms)
    pub t_ref: f64,
    /// Threshold relative to `e_l` (mV)
    pub theta: f64,
    /// Reset potential relative to `e_l` (mV)
    pub v_reset: f64,
    /// Constant external current (pA)
    pub i_e: f64,
    pub scheme: IntegrationScheme,
}

impl Default for IafPscExpParameters {
    fn default() -> Self {
        Self {
            e_l: -70.0,
            c_m: 250.0,
            tau_m: 10.0,
            tau_syn_ex: 2.0,
            tau_syn_in: 2.0,
            t_ref: 2.0,
            theta: 15.0,
            v_reset: 0.0,
            i_e: 0.0,
            scheme: IntegrationScheme::Exact,
        }
    }
}

impl IafPscExpParameters {
    fn write(&self, d: &mut StatusDict) {
        d.insert("E_L", self.e_l);
        d.insert("C_m", self.c_m);
        d.insert("tau_m", self.tau_m);
        d.insert("tau_syn_ex", self.tau_syn_ex);
        d.insert("tau_syn_in", self.tau_syn_in);
        d.insert("t_ref", self.t_ref);
        d.insert("V_th", self.theta + self.e_l);
        d.insert("V_reset", self.v_reset + self.e_l);
        d.insert("I_e", self.i_e);
        d.insert("integration_scheme", self.scheme.as_str());
    }

    /// Apply entries from `r`; returns the change of `E_L`
    fn read(&mut self, r: &mut StatusReader<'_>) -> Result<f64> {
        let old_e_l = self.e_l;
        r.update_f64("E_L", &mut self.e_l)?;
        let delta_e_l = self.e_l - old_e_l;

        // absolute thresholds stay put when only E_L moves
        if r.update_f64("V_reset", &mut self.v_reset)? {
            self.v_reset -= self.e_l;
        } else {
            self.v_reset -= delta_e_l;
        }
        if r.update_f64("V_th", &mut self.theta)? {
            self.theta -= self.e_l;
        } else {
            self.theta -= delta_e_l;
        }

        r.update_f64("C_m", &mut self.c_m)?;
        r.update_f64("tau_m", &mut self.tau_m)?;
        r.update_f64("tau_syn_ex", &mut self.tau_syn_ex)?;
        r.update_f64("tau_syn_in", &mut self.tau_syn_in)?;
        r.update_f64("t_ref", &mut self.t_ref)?;
        r.update_f64("I_e", &mut self.i_e)?;

        if let Some(v) = r.value("integration_scheme") {
            let name = v.as_str().ok_or(NeuralError::StatusTypeMismatch {
                key: "integration_scheme".to_string(),
                expected: "string",
            })?;
            self.scheme = IntegrationScheme::from_name(name).ok_or_else(|| {
                NeuralError::bad_value("integration_scheme", format!("unknown scheme '{name}'"))
            })?;
        }
        Ok(delta_e_l)
    }

    pub fn validate(&self) -> Result<()> {
        if self.v_reset >= self.theta {
            return Err(NeuralError::BadProperty(
                "Reset potential must be smaller than threshold.".to_string(),
            ));
        }
        if self.c_m <= 0.0 {
            return Err(NeuralError::BadProperty(
                "Capacitance must be strictly positive.".to_string(),
            ));
        }
        if self.tau_m <= 0.0 || self.tau_syn_ex <= 0.0 || self.tau_syn_in <= 0.0 {
            return Err(NeuralError::BadProperty(
                "Membrane and synapse time constants must be strictly positive.".to_string(),
            ));
        }
        if self.t_ref < 0.0 {
            return Err(NeuralError::BadProperty(
                "Refractory time must not be negative.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dynamic state. `v_m` is relative to `E_L`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IafPscExpState {
    pub v_m: f64,
    pub i_syn_ex: f64,
    pub i_syn_in: f64,
    /// Piecewise-constant current entering the membrane directly
    pub i_0: f64,
    /// Current filtered through the excitatory synapse
    pub i_1: f64,
    /// Remaining refractory steps
    pub r_ref: Step,
}

impl IafPscExpState {
    fn write(&self, d: &mut StatusDict, p: &IafPscExpParameters) {
        d.insert("V_m", self.v_m + p.e_l);
    }

    fn read(&mut self, r: &mut StatusReader<'_>, p: &IafPscExpParameters, delta_e_l: f64) -> Result<()> {
        if r.update_f64("V_m", &mut self.v_m)? {
            self.v_m -= p.e_l;
        } else {
            self.v_m -= delta_e_l;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Buffers {
    spikes_ex: RingBuffer,
    spikes_in: RingBuffer,
    currents: MultiChannelBuffer<2>,
}

/// Coefficients derived on calibration
#[derive(Debug, Clone, Default)]
struct Variables {
    props: ExpPropagators,
    refractory_counts: Step,
    calibrated: bool,
}

fn rec_v_m(p: &IafPscExpParameters, s: &IafPscExpState) -> f64 {
    s.v_m + p.e_l
}
fn rec_i_syn_ex(_: &IafPscExpParameters, s: &IafPscExpState) -> f64 {
    s.i_syn_ex
}
fn rec_i_syn_in(_: &IafPscExpParameters, s: &IafPscExpState) -> f64 {
    s.i_syn_in
}

static RECORDABLES: RecordablesMap<IafPscExpParameters, IafPscExpState> = RecordablesMap::new(&[
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
]);

/// Leaky integrate-and-fire neuron with exponential current synapses
#[derive(Debug, Clone, Default)]
pub struct IafPscExp {
    id: NodeId,
    params: IafPscExpParameters,
    state: IafPscExpState,
    buffers: Buffers,
    vars: Variables,
    logger: DataLogger<IafPscExpParameters, IafPscExpState>,
    last_spike: Option<Step>,
}

impl IafPscExp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a neuron from explicit parameters (validated)
    pub fn with_parameters(params: IafPscExpParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    pub fn parameters(&self) -> &IafPscExpParameters {
        &self.params
    }

    pub fn state(&self) -> &IafPscExpState {
        &self.state
    }

    /// Absolute membrane potential in mV
    pub fn v_m(&self) -> f64 {
        self.state.v_m + self.params.e_l
    }

    /// Step stamp of the most recent spike
    pub fn last_spike(&self) -> Option<Step> {
        self.last_spike
    }

    pub fn recordables() -> &'static RecordablesMap<IafPscExpParameters, IafPscExpState> {
        &RECORDABLES
    }
}

impl Node for IafPscExp {
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
        let len = ctx.buffer_len();
        self.buffers.spikes_ex.resize(len);
        self.buffers.spikes_in.resize(len);
        self.buffers.currents.resize(len);
        self.logger.reset();
        self.last_spike = None;
    }

    fn calibrate(&mut self, ctx: &SimulationContext) -> Result<()> {
        self.params.validate()?;
        let h = ctx.resolution.ms();
        let p = &self.params;
        self.vars.props = ExpPropagators::compute(p.tau_m, p.c_m, p.tau_syn_ex, p.tau_syn_in, h, p.scheme);
        self.vars.refractory_counts = ctx.resolution.ms_to_steps(p.t_ref);
        assert!(self.vars.refractory_counts >= 0);
        self.vars.calibrated = true;
        debug!(
            "[{}] node {} calibrated: h={}ms refractory_counts={} {:?}",
            MODEL_NAME, self.id, h, self.vars.refractory_counts, self.vars.props
        );
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
        assert!(self.vars.calibrated, "{MODEL_NAME} updated before calibrate");

        let props = self.vars.props;
        for lag in from..to {
            let slot = ctx.slot_for_lag(lag);
            let s = &mut self.state;

            if s.r_ref == 0 {
                s.v_m = s.v_m * props.p22
                    + s.i_syn_ex * props.p21_ex
                    + s.i_syn_in * props.p21_in
                    + (self.params.i_e + s.i_0) * props.p20;
            } else {
                s.r_ref -= 1;
            }

            s.i_syn_ex *= props.p11_ex;
            s.i_syn_in *= props.p11_in;
            s.i_syn_ex += (1.0 - props.p11_ex) * s.i_1;

            s.i_syn_ex += self.buffers.spikes_ex.get_value(slot);
            s.i_syn_in += self.buffers.spikes_in.get_value(slot);

            if s.v_m >= self.params.theta {
                s.r_ref = self.vars.refractory_counts;
                s.v_m = self.params.v_reset;
                let stamp = ctx.slice_origin + lag + 1;
                self.last_spike = Some(stamp);
                trace!("[{}] node {} spiked at step {}", MODEL_NAME, self.id, stamp);
                sink.send(OutgoingSpike {
                    sender: self.id,
                    lag,
                    stamp,
                });
            }

            s.i_0 = self.buffers.currents.get_value(slot, I0);
            s.i_1 = self.buffers.currents.get_value(slot, I1);

            self.logger
                .record_data(ctx.slice_origin + lag + 1, &self.params, &self.state);
        }
    }

    fn handle_spike(&mut self, ctx: &SimulationContext, event: &SpikeEvent) {
        assert!(event.delay_steps > 0);
        let slot = ctx.slot(event.delivery_step());
        let amplitude = event.weighted();
        if event.weight > 0.0 {
            self.buffers.spikes_ex.add_value(slot, amplitude);
        } else {
            self.buffers.spikes_in.add_value(slot, amplitude);
        }
    }

    fn handle_current(&mut self, ctx: &SimulationContext, event: &CurrentEvent) {
        assert!(event.delay_steps > 0);
        let slot = ctx.slot(event.delivery_step());
        let amplitude = event.weight * event.current;
        match event.rport {
            0 => self.buffers.currents.add_value(slot, I0, amplitude),
            1 => self.buffers.currents.add_value(slot, I1, amplitude),
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
        self.state.write(&mut d, &self.params);
        d.insert("recordables", RECORDABLES.names());
        d.insert("model", MODEL_NAME);
        d.insert("t_spike", self.last_spike.map_or(-1.0, |s| s as f64));
        d
    }

    fn set_status(&mut self, status: &StatusDict) -> Result<()> {
        let mut r = status.reader();
        let mut params = self.params.clone();
        let delta_e_l = params.read(&mut r)?;
        params.validate()?;
        let mut state = self.state.clone();
        state.read(&mut r, &params, delta_e_l)?;
        r.skip_read_only(&["recordables", "model", "t_spike"]);
        r.finish(MODEL_NAME)?;

        self.params = params;
        self.state = state;
        self.vars.calibrated = false;
        debug!("[{}] node {} status updated", MODEL_NAME, self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn ctx() -> SimulationContext {
        SimulationContext::default()
    }

    fn ready(neuron: &mut IafPscExp, ctx: &SimulationContext) {
        neuron.init_buffers(ctx);
        neuron.calibrate(ctx).unwrap();
    }

    #[test]
    fn test_defaults_in_absolute_terms() {
        let d = IafPscExp::new().get_status();
        assert_eq!(d.get_f64("V_th"), Some(-55.0));
        assert_eq!(d.get_f64("V_reset"), Some(-70.0));
        assert_eq!(d.get_f64("V_m"), Some(-70.0));
        assert_eq!(d.get_f64("C_m"), Some(250.0));
    }

    #[test]
    fn test_e_l_change_keeps_absolute_threshold() {
        let mut n = IafPscExp::new();
        n.set_status(&StatusDict::new().with("E_L", -65.0)).unwrap();
        let d = n.get_status();
        assert_eq!(d.get_f64("V_th"), Some(-55.0));
        assert_eq!(d.get_f64("V_m"), Some(-70.0));
        assert_eq!(n.parameters().theta, 10.0);
    }

    #[test]
    fn test_invalid_parameters_rejected_atomically() {
        let mut n = IafPscExp::new();
        let err = n
            .set_status(&StatusDict::new().with("I_e", 100.0).with("tau_m", 0.0))
            .unwrap_err();
        assert!(matches!(err, NeuralError::BadProperty(_)));
        assert_eq!(n.parameters().i_e, 0.0);
        assert_eq!(n.parameters().tau_m, 10.0);

        assert!(n.set_status(&StatusDict::new().with("V_reset", -50.0)).is_err());
        assert!(n.set_status(&StatusDict::new().with("C_m", -1.0)).is_err());
        assert!(n.set_status(&StatusDict::new().with("t_ref", -0.1)).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut n = IafPscExp::new();
        let err = n.set_status(&StatusDict::new().with("tau_mem", 5.0)).unwrap_err();
        assert!(matches!(err, NeuralError::UnaccessedStatusKeys { .. }));
    }

    #[test]
    fn test_get_status_roundtrips() {
        let mut n = IafPscExp::new();
        let d = n.get_status();
        n.set_status(&d).unwrap();
        assert_eq!(n.get_status(), d);
    }

    #[test]
    fn test_receptor_checks() {
        let n = IafPscExp::new();
        assert_eq!(n.handles_test_spike(0), Ok(0));
        assert!(matches!(
            n.handles_test_spike(1),
            Err(NeuralError::UnknownReceptorType { receptor: 1, .. })
        ));
        assert_eq!(n.handles_test_current(1), Ok(1));
        assert!(n.handles_test_current(2).is_err());
    }

    #[test]
    fn test_constant_current_drives_regular_spiking() {
        let ctx = ctx();
        let mut n = IafPscExp::new();
        n.set_status(&StatusDict::new().with("I_e", 1000.0)).unwrap();
        ready(&mut n, &ctx);

        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = ctx;
        for _ in 0..50 {
            n.update(&ctx, 0, ctx.min_delay, &mut sink, &mut rng);
            ctx.advance_slice();
        }
        assert!(sink.len() >= 5);
        // refractory period of 2 ms = 20 steps separates every pair
        for pair in sink.windows(2) {
            assert!(pair[1].stamp - pair[0].stamp > 20);
        }
    }

    #[test]
    fn test_inhibitory_spike_hyperpolarizes() {
        let ctx = ctx();
        let mut n = IafPscExp::new();
        ready(&mut n, &ctx);
        let mut e = SpikeEvent::new(NodeId(9), 0);
        e.weight = -100.0;
        n.handle_spike(&ctx, &e);

        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, 10, &mut sink, &mut StepRng::new(0, 1));
        assert!(n.v_m() < -70.0);
        assert!(n.state().i_syn_in < 0.0);
        assert!(sink.is_empty());
    }

    #[test]
    #[should_panic(expected = "before calibrate")]
    fn test_update_requires_calibration() {
        let ctx = ctx();
        let mut n = IafPscExp::new();
        n.init_buffers(&ctx);
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, 1, &mut sink, &mut StepRng::new(0, 1));
    }

    #[test]
    fn test_recording_membrane_potential() {
        let ctx = ctx();
        let mut n = IafPscExp::new();
        let port = n
            .connect_logging_device(&DataLoggingRequest::new(["V_m", "I_syn_ex"], 1))
            .unwrap();
        ready(&mut n, &ctx);
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, 5, &mut sink, &mut StepRng::new(0, 1));
        let data = n.handle_data_logging_request(port).unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data[0].step, 1);
        assert_eq!(data[0].values, vec![-70.0, 0.0]);
        assert!(n
            .connect_logging_device(&DataLoggingRequest::new(["omega"], 1))
            .is_err());
    }
}
