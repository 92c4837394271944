// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Instrumentation traces of forced weight updates
//!
//! Every forced update appends one [`PlasticitySample`]. With
//! [`HistoryRetention::Unbounded`] the traces grow for the lifetime of the
//! synapse (five `f64` per update and synapse). `Capped(n)` keeps only the
//! most recent `n` samples.

use std::collections::VecDeque;

use crate::rate_rule::PlasticityRegime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRetention {
    #[default]
    Unbounded,
    Capped(usize),
}

impl HistoryRetention {
    /// `None` maps to `Unbounded`
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        capacity.map_or(HistoryRetention::Unbounded, HistoryRetention::Capped)
    }

    pub fn capacity(&self) -> Option<usize> {
        match self {
            HistoryRetention::Unbounded => None,
            HistoryRetention::Capped(n) => Some(*n),
        }
    }
}

/// One forced-update record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasticitySample {
    pub v_m: f64,
    pub rate: f64,
    pub weight: f64,
    pub delta: f64,
    pub regime: PlasticityRegime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightHistory {
    samples: VecDeque<PlasticitySample>,
    retention: HistoryRetention,
}

impl WeightHistory {
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }

    /// Change the policy, dropping the oldest samples if the new cap is smaller
    pub fn set_retention(&mut self, retention: HistoryRetention) {
        self.retention = retention;
        self.enforce_cap();
    }

    pub fn push(&mut self, sample: PlasticitySample) {
        self.samples.push_back(sample);
        self.enforce_cap();
    }

    fn enforce_cap(&mut self) {
        if let HistoryRetention::Capped(n) = self.retention {
            while self.samples.len() > n {
                self.samples.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlasticitySample> {
        self.samples.iter()
    }

    pub fn membrane_potentials(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.v_m).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.rate).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.weight).collect()
    }

    pub fn deltas(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.delta).collect()
    }

    pub fn flags(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.regime.flag()).collect()
    }
}
