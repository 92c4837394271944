// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Rate-modulated Plasticity Synapse
//!
//! Two independent entry points:
//!
//! - [`Connection::send`] forwards a presynaptic spike with the current
//!   weight and marks presynaptic activity. It never changes the weight.
//! - [`MatcoSynapse::force_update_weight`] runs on every trigger of the
//!   assigned [`UpdaterDevice`](crate::UpdaterDevice). It advances the rate
//!   trace `omega_E`, reads the postsynaptic membrane potential through the
//!   host's node lookup and applies the rule in [`crate::rate_rule`].
//!
//! The activity flag feeding `omega_E` is the synapse's own presynaptic
//! flag by default; [`RateSource::Postsynaptic`] uses the target's
//! "just spiked" flag instead.

use serde_json::Value;
use tracing::{debug, trace};

use spikecore_npu_neural::{
    NeuralError, Node, NodeId, NodeLookup, Result, Rport, SimulationContext, SpikeEvent,
    StatusDict,
};

use crate::connection::{Connection, ConnectionBase};
use crate::history::{HistoryRetention, PlasticitySample, WeightHistory};
use crate::rate_rule::{classify, update_rate_trace, PlasticityRegime, RateRuleThresholds};

pub const MODEL_NAME: &str = "matco_synapse";

/// Default relative weight change per forced update
pub const DEFAULT_LEARNING_RATE: f64 = 0.0008;

/// Which activity flag drives the rate trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateSource {
    /// Set by `send`, cleared by each forced update
    #[default]
    Presynaptic,
    /// The target's most recent spike flag
    Postsynaptic,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::Presynaptic => "presynaptic",
            RateSource::Postsynaptic => "postsynaptic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "presynaptic" => Some(RateSource::Presynaptic),
            "postsynaptic" => Some(RateSource::Postsynaptic),
            _ => None,
        }
    }
}

/// Properties shared by all synapses of the model
#[derive(Debug, Clone, PartialEq)]
pub struct MatcoCommonProperties {
    updater: Option<NodeId>,
    pub learning_rate: f64,
}

impl Default for MatcoCommonProperties {
    fn default() -> Self {
        Self {
            updater: None,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl MatcoCommonProperties {
    pub fn updater(&self) -> Option<NodeId> {
        self.updater
    }

    /// The assigned updater, or [`NeuralError::NoWeightUpdater`]
    pub fn require_updater(&self) -> Result<NodeId> {
        self.updater.ok_or(NeuralError::NoWeightUpdater)
    }

    /// Assign the updater device; `id` must name a weight-updater node
    pub fn set_updater(&mut self, id: NodeId, lookup: &dyn NodeLookup) -> Result<()> {
        let node = lookup.node(id).ok_or(NeuralError::NodeNotFound(id))?;
        if !node.is_weight_updater() {
            return Err(NeuralError::BadProperty("Must be updater device".to_string()));
        }
        self.updater = Some(id);
        Ok(())
    }

    pub fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        d.insert("U", self.updater.map_or(-1, |id| id.0 as i64));
        d.insert("learning_rate", self.learning_rate);
        d
    }

    pub fn set_status(&mut self, status: &StatusDict, lookup: &dyn NodeLookup) -> Result<()> {
        let mut r = status.reader();
        let mut next = self.clone();
        r.update_f64("learning_rate", &mut next.learning_rate)?;
        let mut id = -1;
        if r.update_i64("U", &mut id)? {
            if id < 0 {
                return Err(NeuralError::BadProperty("Must be updater device".to_string()));
            }
            next.set_updater(NodeId(id as u64), lookup)?;
        }
        r.finish(MODEL_NAME)?;
        *self = next;
        Ok(())
    }
}

/// Synapse with rate-based LTP/LTD applied on periodic triggers
#[derive(Debug, Clone, PartialEq)]
pub struct MatcoSynapse {
    base: ConnectionBase,
    weight: f64,
    /// Time of the last forwarded spike (ms)
    t_lastspike: f64,
    omega_e: f64,
    tau: f64,
    phi: bool,
    thresholds: RateRuleThresholds,
    rate_source: RateSource,
    history: WeightHistory,
}

impl MatcoSynapse {
    pub fn new(base: ConnectionBase) -> Self {
        Self {
            base,
            weight: 1.0,
            t_lastspike: 0.0,
            omega_e: 0.0,
            tau: 30.0,
            phi: false,
            thresholds: RateRuleThresholds::default(),
            rate_source: RateSource::default(),
            history: WeightHistory::default(),
        }
    }

    pub fn with_retention(base: ConnectionBase, retention: HistoryRetention) -> Self {
        Self {
            history: WeightHistory::new(retention),
            ..Self::new(base)
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn omega_e(&self) -> f64 {
        self.omega_e
    }

    pub fn phi(&self) -> bool {
        self.phi
    }

    pub fn t_lastspike(&self) -> f64 {
        self.t_lastspike
    }

    pub fn thresholds(&self) -> &RateRuleThresholds {
        &self.thresholds
    }

    pub fn history(&self) -> &WeightHistory {
        &self.history
    }

    /// Apply one periodic plasticity step
    ///
    /// Fails without touching the synapse if no updater is assigned or the
    /// target cannot be read as a postsynaptic neuron.
    pub fn force_update_weight(
        &mut self,
        t_trig: f64,
        cp: &MatcoCommonProperties,
        lookup: &dyn NodeLookup,
    ) -> Result<PlasticityRegime> {
        cp.require_updater()?;
        let target = lookup.postsynaptic(self.base.target())?;
        let v_m = target.membrane_potential();
        let active = match self.rate_source {
            RateSource::Presynaptic => self.phi,
            RateSource::Postsynaptic => target.just_spiked(),
        };

        self.omega_e = update_rate_trace(self.omega_e, active, self.tau);
        self.phi = false;

        let regime = classify(self.omega_e, v_m, &self.thresholds);
        let delta = regime.delta(cp.learning_rate);
        self.weight += self.weight * delta;

        self.history.push(PlasticitySample {
            v_m,
            rate: self.omega_e,
            weight: self.weight,
            delta,
            regime,
        });
        trace!(
            "[{}] t={}ms target={} V_m={} omega_E={} -> {} weight={}",
            MODEL_NAME,
            t_trig,
            self.base.target(),
            v_m,
            self.omega_e,
            regime.as_str(),
            self.weight
        );
        Ok(regime)
    }
}

impl Connection for MatcoSynapse {
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn send(&mut self, ctx: &SimulationContext, event: &mut SpikeEvent, target: &mut dyn Node) {
        self.phi = true;
        let t_spike = ctx.resolution.steps_to_ms(event.stamp);
        self.base.deliver(ctx, event, self.weight, target);
        self.t_lastspike = t_spike;
    }

    /// Also requires a target whose membrane potential the rule can read
    fn check_connection(&self, target: &dyn Node) -> Result<Rport> {
        let rport = self.base.check_connection(target)?;
        if target.as_postsynaptic().is_none() {
            return Err(NeuralError::IncompatibleTarget {
                node: target.node_id(),
                model: target.model_name().to_string(),
                reason: "does not expose membrane potential and spike flag",
            });
        }
        Ok(rport)
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        self.base.write(&mut d);
        d.insert("weight", self.weight);
        d.insert("tau", self.tau);
        d.insert("theta", self.thresholds.theta);
        d.insert("theta_minus", self.thresholds.theta_minus);
        d.insert("theta_plus", self.thresholds.theta_plus);
        d.insert("rate_source", self.rate_source.as_str());
        d.insert(
            "history_capacity",
            self.history
                .retention()
                .capacity()
                .map_or(Value::Null, |n| Value::from(n as u64)),
        );
        d.insert("rate", self.history.rates());
        d.insert("V_m", self.history.membrane_potentials());
        d.insert("delta", self.history.deltas());
        d.insert("weights", self.history.weights());
        d.insert("type_id", self.history.flags());
        d
    }

    fn set_status(&mut self, status: &StatusDict) -> Result<()> {
        let mut r = status.reader();
        let mut base = self.base;
        base.read(&mut r)?;

        let mut weight = self.weight;
        let mut tau = self.tau;
        let mut thresholds = self.thresholds;
        r.update_f64("weight", &mut weight)?;
        r.update_f64("tau", &mut tau)?;
        r.update_f64("theta", &mut thresholds.theta)?;
        r.update_f64("theta_minus", &mut thresholds.theta_minus)?;
        r.update_f64("theta_plus", &mut thresholds.theta_plus)?;

        if tau <= 0.0 {
            return Err(NeuralError::BadProperty(
                "Rate time constant must be strictly positive.".to_string(),
            ));
        }
        if thresholds.theta_minus > thresholds.theta_plus {
            return Err(NeuralError::BadProperty(
                "theta_minus must not exceed theta_plus.".to_string(),
            ));
        }

        let rate_source = match r.value("rate_source") {
            None => self.rate_source,
            Some(v) => v.as_str().and_then(RateSource::from_name).ok_or_else(|| {
                NeuralError::bad_value("rate_source", "expected 'presynaptic' or 'postsynaptic'")
            })?,
        };
        let retention = match r.value("history_capacity") {
            None => self.history.retention(),
            Some(Value::Null) => HistoryRetention::Unbounded,
            Some(v) => v
                .as_u64()
                .map(|n| HistoryRetention::Capped(n as usize))
                .ok_or_else(|| {
                    NeuralError::bad_value("history_capacity", "expected null or a non-negative integer")
                })?,
        };

        r.skip_read_only(&["rate", "V_m", "delta", "weights", "type_id"]);
        r.finish(MODEL_NAME)?;

        self.base = base;
        self.weight = weight;
        self.tau = tau;
        self.thresholds = thresholds;
        self.rate_source = rate_source;
        self.history.set_retention(retention);
        Ok(())
    }
}

/// Apply one trigger of `updater` to every synapse of the model
///
/// Returns how many synapses were updated (zero when the common properties
/// name a different updater). Every target is resolved before any synapse
/// changes, so a failed trigger leaves all of them untouched.
pub fn force_update_all(
    synapses: &mut [MatcoSynapse],
    updater: NodeId,
    t_trig: f64,
    cp: &MatcoCommonProperties,
    lookup: &dyn NodeLookup,
) -> Result<usize> {
    if cp.require_updater()? != updater {
        return Ok(0);
    }
    for synapse in synapses.iter() {
        lookup.postsynaptic(synapse.base.target())?;
    }
    for synapse in synapses.iter_mut() {
        synapse.force_update_weight(t_trig, cp, lookup)?;
    }
    debug!(
        "[{}] updater {} applied trigger at {}ms to {} synapses",
        MODEL_NAME,
        updater,
        t_trig,
        synapses.len()
    );
    Ok(synapses.len())
}
