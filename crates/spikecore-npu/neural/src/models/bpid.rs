// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Binary Stochastic Unit with Receptive and Contextual Fields
//!
//! Each step the unit integrates two independent input fields, combines them
//! into an activation and squashes it to a firing probability:
//!
//! ```text
//! RF = spikes_rf - w_0
//! CF = spikes_cf - v_0
//!
//! additive:    a = k1*RF + k2*CF
//! modulatory:  a = RF * (k1 + (1 - k1) * exp(k2 * RF * CF))
//!
//! theta = logistic(a)   (saturates to 0/1 beyond |a| ~ 20)
//! ```
//!
//! The unit fires at most once per min-delay block: the draw `u < theta`
//! happens only on the last step of each `update` call.
//!
//! ## Receptor ports
//!
//! The last decimal digit of an rport is the receptor kind (0 spike
//! recorder, 1 receptive field, 2 contextual field) and the remaining digits
//! number the individual receptor, so `31` is receptive-field receptor 3.

use rand::{Rng, RngCore};
use serde_json::json;
use tracing::{debug, trace};

use super::traits::{assert_update_range, Node};
use crate::buffers::RingBuffer;
use crate::recording::{DataLogger, LoggedSample, Recordable, RecordablesMap};
use crate::status::{StatusDict, StatusReader};
use crate::types::{
    DataLoggingRequest, NeuralError, NodeId, OutgoingSpike, Result, Rport, SimulationContext,
    SpikeEvent, SpikeSink, Step,
};

pub const MODEL_NAME: &str = "bpid_kp_2017";

/// Activation magnitude beyond which the logistic saturates
pub const LOGISTIC_SATURATION: f64 = 20.0;
const SATURATION_REL_TOLERANCE: f64 = 1e-6;

/// Receptor kinds (last digit of an rport)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptorKind {
    SpikeRecorder = 0,
    ReceptiveField = 1,
    ContextualField = 2,
}

impl ReceptorKind {
    /// Split an rport into its kind and receptor number
    pub fn decode(rport: Rport) -> Option<(ReceptorKind, usize)> {
        let kind = match rport % 10 {
            0 => ReceptorKind::SpikeRecorder,
            1 => ReceptorKind::ReceptiveField,
            2 => ReceptorKind::ContextualField,
            _ => return None,
        };
        Some((kind, rport / 10))
    }

    pub fn encode(self, number: usize) -> Rport {
        number * 10 + self as Rport
    }
}

/// How the two fields are combined into an activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationType {
    #[default]
    Additive = 0,
    Modulatory = 1,
}

impl IntegrationType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(IntegrationType::Additive),
            1 => Some(IntegrationType::Modulatory),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "additive" => Some(IntegrationType::Additive),
            "modulatory" => Some(IntegrationType::Modulatory),
            _ => None,
        }
    }

    /// Mixing coefficients `(k1, k2)` used when not given explicitly
    pub fn default_coefficients(self) -> (f64, f64) {
        match self {
            IntegrationType::Additive => (1.0, 1.0),
            IntegrationType::Modulatory => (0.5, 2.0),
        }
    }

    /// Combine receptive and contextual field into an activation
    pub fn activation(self, k1: f64, k2: f64, rf: f64, cf: f64) -> f64 {
        match self {
            IntegrationType::Additive => k1 * rf + k2 * cf,
            IntegrationType::Modulatory => rf * (k1 + (1.0 - k1) * (k2 * rf * cf).exp()),
        }
    }
}

/// Logistic function that saturates to exactly 0 or 1 for large arguments
///
/// Panics on a non-finite activation.
pub fn safe_logistic(x: f64) -> f64 {
    assert!(x.is_finite(), "non-finite activation {x}");
    let upper_tol = x.abs().max(LOGISTIC_SATURATION) * SATURATION_REL_TOLERANCE;
    if x - LOGISTIC_SATURATION > upper_tol {
        1.0
    } else if -LOGISTIC_SATURATION - x > upper_tol {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BpidParameters {
    pub k1: f64,
    pub k2: f64,
    pub integration_type: IntegrationType,
    /// Stored for the host's learning protocol
    pub phis: Vec<f64>,
    /// Smoothing rate of the mean firing probability `E`
    pub alpha: f64,
    /// Smoothing rate of the field correlations `E_r`, `E_c`
    pub beta: f64,
    /// Stored for the host's learning protocol
    pub eta: f64,
    /// Learning interval (ms)
    pub interval: f64,
}

impl Default for BpidParameters {
    fn default() -> Self {
        Self {
            k1: 1.0,
            k2: 1.0,
            integration_type: IntegrationType::Additive,
            phis: Vec::new(),
            alpha: 0.01,
            beta: 0.01,
            eta: 0.01,
            interval: 1.0,
        }
    }
}

impl BpidParameters {
    fn write(&self, d: &mut StatusDict) {
        d.insert("alpha", self.alpha);
        d.insert("beta", self.beta);
        d.insert("eta", self.eta);
        d.insert("k1", self.k1);
        d.insert("k2", self.k2);
        d.insert("integration_type", self.integration_type as i64);
        d.insert("interval", self.interval);
        d.insert("phis", self.phis.clone());
    }

    fn read(&mut self, r: &mut StatusReader<'_>) -> Result<()> {
        r.update_f64("alpha", &mut self.alpha)?;
        r.update_f64("beta", &mut self.beta)?;
        r.update_f64("eta", &mut self.eta)?;
        let k1_given = r.update_f64("k1", &mut self.k1)?;
        let k2_given = r.update_f64("k2", &mut self.k2)?;

        if let Some(v) = r.value("integration_type") {
            let parsed = match v {
                serde_json::Value::String(name) => IntegrationType::from_name(name),
                other => other.as_i64().and_then(IntegrationType::from_code),
            };
            self.integration_type = parsed.ok_or_else(|| {
                NeuralError::bad_value("integration_type", format!("unknown integration type {v}"))
            })?;
            let (k1, k2) = self.integration_type.default_coefficients();
            if !k1_given {
                self.k1 = k1;
            }
            if !k2_given {
                self.k2 = k2;
            }
        }

        r.update_f64("interval", &mut self.interval)?;
        r.update_f64_vec("phis", &mut self.phis)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval <= 0.0 {
            return Err(NeuralError::BadProperty(
                "Learning interval must be strictly positive.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BpidState {
    /// Running mean of the firing probability
    pub e: f64,
    /// Running mean of `theta * CF`
    pub e_c: f64,
    /// Running mean of `theta * RF`
    pub e_r: f64,
    /// Firing probability of the most recent step
    pub theta: f64,
    /// Receptive-field baseline
    pub w_0: f64,
    /// Contextual-field baseline
    pub v_0: f64,
    pub receptive_field: f64,
    pub contextual_field: f64,
}

impl Default for BpidState {
    fn default() -> Self {
        Self {
            e: 0.01,
            e_c: 0.01,
            e_r: 0.01,
            theta: 0.0,
            w_0: 0.0,
            v_0: 0.0,
            receptive_field: 0.0,
            contextual_field: 0.0,
        }
    }
}

impl BpidState {
    fn write(&self, d: &mut StatusDict) {
        d.insert("theta", self.theta);
        d.insert("w_0", self.w_0);
        d.insert("v_0", self.v_0);
        d.insert("receptive_field", self.receptive_field);
        d.insert("contextual_field", self.contextual_field);
        d.insert("E", self.e);
        d.insert("E_r", self.e_r);
        d.insert("E_c", self.e_c);
    }

    fn read(&mut self, r: &mut StatusReader<'_>) -> Result<()> {
        r.update_f64("theta", &mut self.theta)?;
        r.update_f64("w_0", &mut self.w_0)?;
        r.update_f64("v_0", &mut self.v_0)?;
        r.update_f64("receptive_field", &mut self.receptive_field)?;
        r.update_f64("contextual_field", &mut self.contextual_field)?;
        r.update_f64("E", &mut self.e)?;
        r.update_f64("E_r", &mut self.e_r)?;
        r.update_f64("E_c", &mut self.e_c)?;
        Ok(())
    }

    /// One learning step of the running averages
    fn learn(&mut self, p: &BpidParameters) {
        self.e += p.alpha * (self.theta - self.e);
        self.e_r += p.beta * (self.theta * self.receptive_field - self.e_r);
        self.e_c += p.beta * (self.theta * self.contextual_field - self.e_c);
    }
}

fn rec_receptive_field(_: &BpidParameters, s: &BpidState) -> f64 {
    s.receptive_field
}
fn rec_contextual_field(_: &BpidParameters, s: &BpidState) -> f64 {
    s.contextual_field
}
fn rec_theta(_: &BpidParameters, s: &BpidState) -> f64 {
    s.theta
}

static RECORDABLES: RecordablesMap<BpidParameters, BpidState> = RecordablesMap::new(&[
    Recordable {
        name: "receptive_field",
        accessor: rec_receptive_field,
    },
    Recordable {
        name: "contextual_field",
        accessor: rec_contextual_field,
    },
    Recordable {
        name: "theta",
        accessor: rec_theta,
    },
]);

#[derive(Debug, Clone, Default)]
pub struct BpidKp2017 {
    id: NodeId,
    params: BpidParameters,
    state: BpidState,
    spikes_rf: RingBuffer,
    spikes_cf: RingBuffer,
    logger: DataLogger<BpidParameters, BpidState>,
    interval_steps: Step,
    last_spike: Option<Step>,
    calibrated: bool,
}

impl BpidKp2017 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: BpidParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    pub fn parameters(&self) -> &BpidParameters {
        &self.params
    }

    pub fn state(&self) -> &BpidState {
        &self.state
    }

    pub fn last_spike(&self) -> Option<Step> {
        self.last_spike
    }
}

impl Node for BpidKp2017 {
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
        self.spikes_rf.resize(ctx.buffer_len());
        self.spikes_cf.resize(ctx.buffer_len());
        self.logger.reset();
        self.last_spike = None;
    }

    fn calibrate(&mut self, ctx: &SimulationContext) -> Result<()> {
        self.params.validate()?;
        self.interval_steps = ctx.resolution.ms_to_steps(self.params.interval).max(1);
        self.calibrated = true;
        debug!(
            "[{}] node {} calibrated: {:?} k1={} k2={} interval_steps={}",
            MODEL_NAME,
            self.id,
            self.params.integration_type,
            self.params.k1,
            self.params.k2,
            self.interval_steps
        );
        Ok(())
    }

    fn update(
        &mut self,
        ctx: &SimulationContext,
        from: Step,
        to: Step,
        sink: &mut dyn SpikeSink,
        rng: &mut dyn RngCore,
    ) {
        assert_update_range(ctx, from, to);
        assert!(self.calibrated, "{MODEL_NAME} updated before calibrate");

        let p = &self.params;
        for lag in from..to {
            let slot = ctx.slot_for_lag(lag);
            let s = &mut self.state;

            s.receptive_field = self.spikes_rf.get_value(slot) - s.w_0;
            s.contextual_field = self.spikes_cf.get_value(slot) - s.v_0;

            let activation =
                p.integration_type
                    .activation(p.k1, p.k2, s.receptive_field, s.contextual_field);
            s.theta = safe_logistic(activation);

            // at most one emission per min-delay block, even when the host
            // splits the block across several calls
            if from == 0 && lag == to - 1 {
                let stamp = ctx.slice_origin + lag + 1;
                if stamp % self.interval_steps == 0 {
                    s.learn(p);
                }
                if rng.gen::<f64>() < s.theta {
                    self.last_spike = Some(stamp);
                    trace!("[{}] node {} spiked at step {}", MODEL_NAME, self.id, stamp);
                    sink.send(OutgoingSpike {
                        sender: self.id,
                        lag,
                        stamp,
                    });
                }
            }

            self.logger
                .record_data(ctx.slice_origin + lag + 1, &self.params, &self.state);
        }
    }

    fn handle_spike(&mut self, ctx: &SimulationContext, event: &SpikeEvent) {
        assert!(event.delay_steps > 0);
        let slot = ctx.slot(event.delivery_step());
        match ReceptorKind::decode(event.rport) {
            Some((ReceptorKind::ReceptiveField, _)) => {
                self.spikes_rf.add_value(slot, event.weighted())
            }
            _ => self.spikes_cf.add_value(slot, event.weighted()),
        }
    }

    fn handles_test_spike(&self, receptor: Rport) -> Result<Rport> {
        ReceptorKind::decode(receptor)
            .map(|_| receptor)
            .ok_or_else(|| NeuralError::unknown_receptor(receptor, MODEL_NAME))
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
        d.insert(
            "receptor_types",
            json!({
                "receptive_field": ReceptorKind::ReceptiveField as i64,
                "contextual_field": ReceptorKind::ContextualField as i64,
            }),
        );
        d.insert(
            "integration_types",
            json!({
                "additive": IntegrationType::Additive as i64,
                "modulatory": IntegrationType::Modulatory as i64,
            }),
        );
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
        r.skip_read_only(&[
            "receptor_types",
            "integration_types",
            "recordables",
            "model",
            "t_spike",
        ]);
        r.finish(MODEL_NAME)?;

        self.params = params;
        self.state = state;
        self.calibrated = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_safe_logistic_saturates() {
        assert_eq!(safe_logistic(25.0), 1.0);
        assert_eq!(safe_logistic(-25.0), 0.0);
        assert_eq!(safe_logistic(0.0), 0.5);
        // within tolerance of the bound the smooth branch is used
        let edge = safe_logistic(20.0);
        assert!(edge < 1.0 && edge > 0.999_999);
    }

    #[test]
    #[should_panic(expected = "non-finite activation")]
    fn test_safe_logistic_rejects_nan() {
        safe_logistic(f64::NAN);
    }

    #[test]
    fn test_activation_rules() {
        assert_eq!(IntegrationType::Additive.activation(1.0, 2.0, 3.0, 4.0), 11.0);
        let m = IntegrationType::Modulatory.activation(0.5, 2.0, 1.0, 0.0);
        // exp(0) = 1 so the contextual field leaves RF unchanged
        assert!((m - 1.0).abs() < 1e-12);
        let boosted = IntegrationType::Modulatory.activation(0.5, 2.0, 1.0, 0.5);
        assert!(boosted > 1.0);
    }

    #[test]
    fn test_receptor_decoding() {
        assert_eq!(ReceptorKind::decode(1), Some((ReceptorKind::ReceptiveField, 0)));
        assert_eq!(ReceptorKind::decode(32), Some((ReceptorKind::ContextualField, 3)));
        assert_eq!(ReceptorKind::decode(7), None);
        assert_eq!(ReceptorKind::ReceptiveField.encode(4), 41);

        let n = BpidKp2017::new();
        assert_eq!(n.handles_test_spike(21), Ok(21));
        assert!(matches!(
            n.handles_test_spike(5),
            Err(NeuralError::UnknownReceptorType { receptor: 5, .. })
        ));
    }

    #[test]
    fn test_integration_type_sets_default_coefficients() {
        let mut n = BpidKp2017::new();
        n.set_status(&StatusDict::new().with("integration_type", 1)).unwrap();
        assert_eq!((n.parameters().k1, n.parameters().k2), (0.5, 2.0));

        n.set_status(
            &StatusDict::new()
                .with("integration_type", "additive")
                .with("k2", 3.0),
        )
        .unwrap();
        assert_eq!((n.parameters().k1, n.parameters().k2), (1.0, 3.0));

        // without an integration type explicit coefficients stand alone
        n.set_status(&StatusDict::new().with("k1", 0.25)).unwrap();
        assert_eq!(n.parameters().k1, 0.25);

        assert!(n.set_status(&StatusDict::new().with("integration_type", 7)).is_err());
    }

    #[test]
    fn test_fields_subtract_baselines() {
        let ctx = SimulationContext::default();
        let mut n = BpidKp2017::new();
        n.set_status(&StatusDict::new().with("w_0", 0.5).with("v_0", -0.25))
            .unwrap();
        n.init_buffers(&ctx);
        n.calibrate(&ctx).unwrap();

        let mut rf = SpikeEvent::new(NodeId(2), 0);
        rf.rport = ReceptorKind::ReceptiveField.encode(1);
        rf.weight = 2.0;
        n.handle_spike(&ctx, &rf);

        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, 1, &mut sink, &mut StepRng::new(u64::MAX, 0));
        assert_eq!(n.state().receptive_field, 1.5);
        assert_eq!(n.state().contextual_field, 0.25);
        assert!((n.state().theta - safe_logistic(1.75)).abs() < 1e-15);
    }

    #[test]
    fn test_single_emission_per_block() {
        let ctx = SimulationContext::default();
        let mut n = BpidKp2017::new();
        // saturated probability: every draw fires
        n.set_status(&StatusDict::new().with("w_0", -30.0)).unwrap();
        n.init_buffers(&ctx);
        n.calibrate(&ctx).unwrap();

        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, ctx.min_delay, &mut sink, &mut StepRng::new(0, 1));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].lag, ctx.min_delay - 1);
        assert_eq!(n.state().theta, 1.0);
    }

    #[test]
    fn test_split_block_emits_once() {
        let ctx = SimulationContext::default();
        let mut n = BpidKp2017::new();
        n.set_status(&StatusDict::new().with("w_0", -30.0)).unwrap();
        n.init_buffers(&ctx);
        n.calibrate(&ctx).unwrap();

        let half = ctx.min_delay / 2;
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let mut rng = StepRng::new(0, 1);
        n.update(&ctx, 0, half, &mut sink, &mut rng);
        n.update(&ctx, half, ctx.min_delay, &mut sink, &mut rng);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].lag, half - 1);
    }

    #[test]
    fn test_running_averages_learn_on_interval() {
        let ctx = SimulationContext::default();
        let mut n = BpidKp2017::new();
        n.set_status(&StatusDict::new().with("w_0", -30.0).with("alpha", 0.5))
            .unwrap();
        n.init_buffers(&ctx);
        n.calibrate(&ctx).unwrap();
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        n.update(&ctx, 0, ctx.min_delay, &mut sink, &mut StepRng::new(0, 1));
        // E moves half way from 0.01 towards theta = 1
        assert!((n.state().e - 0.505).abs() < 1e-12);
    }

    #[test]
    fn test_status_exposes_port_maps() {
        let d = BpidKp2017::new().get_status();
        assert_eq!(d.get("receptor_types").unwrap()["receptive_field"], json!(1));
        assert_eq!(d.get("integration_types").unwrap()["modulatory"], json!(1));
        let mut n = BpidKp2017::new();
        n.set_status(&d).unwrap();
    }
}
