// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Pure rate-based plasticity rule
//!
//! The rule compares an exponential firing-rate trace `omega_E` against
//! `theta` and the postsynaptic membrane potential against the window
//! `[theta_minus, theta_plus)`:
//!
//! ```text
//! omega_E >= theta,  V_m >= theta_plus                -> LTP                 (+rate)
//! omega_E >= theta,  theta_minus <= V_m < theta_plus  -> homosynaptic LTD    (-rate)
//! omega_E <  theta,  V_m >= theta_plus                -> heterosynaptic LTD  (-rate)
//! otherwise                                           -> no change
//! ```
//!
//! Weights change multiplicatively: `w += w * delta`.

/// Outcome of one forced update. The discriminant is the numeric flag kept
/// in the weight history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlasticityRegime {
    Ltp = 0,
    HomosynapticLtd = 1,
    HeterosynapticLtd = 2,
    None = 3,
}

impl PlasticityRegime {
    /// Signed relative weight change for a given learning rate
    #[inline]
    pub fn delta(self, learning_rate: f64) -> f64 {
        match self {
            PlasticityRegime::Ltp => learning_rate,
            PlasticityRegime::HomosynapticLtd | PlasticityRegime::HeterosynapticLtd => -learning_rate,
            PlasticityRegime::None => 0.0,
        }
    }

    #[inline]
    pub fn flag(self) -> f64 {
        self as u8 as f64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlasticityRegime::Ltp => "ltp",
            PlasticityRegime::HomosynapticLtd => "homosynaptic_ltd",
            PlasticityRegime::HeterosynapticLtd => "heterosynaptic_ltd",
            PlasticityRegime::None => "none",
        }
    }
}

/// Thresholds of the rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRuleThresholds {
    /// Rate threshold on `omega_E`
    pub theta: f64,
    /// Lower membrane-potential threshold
    pub theta_minus: f64,
    /// Upper membrane-potential threshold
    pub theta_plus: f64,
}

impl Default for RateRuleThresholds {
    fn default() -> Self {
        Self {
            theta: 0.05,
            theta_minus: 0.14,
            theta_plus: 0.15,
        }
    }
}

/// Classify a (rate, membrane potential) pair
///
/// # Example
/// ```
/// use spikecore_npu_plasticity::rate_rule::{classify, PlasticityRegime, RateRuleThresholds};
///
/// let t = RateRuleThresholds::default();
/// assert_eq!(classify(0.1, 0.2, &t), PlasticityRegime::Ltp);
/// assert_eq!(classify(0.0, 0.0, &t), PlasticityRegime::None);
/// ```
#[inline]
pub fn classify(omega_e: f64, v_m: f64, t: &RateRuleThresholds) -> PlasticityRegime {
    let active = omega_e >= t.theta;
    if active && v_m >= t.theta_plus {
        PlasticityRegime::Ltp
    } else if active && t.theta_minus <= v_m && v_m < t.theta_plus {
        PlasticityRegime::HomosynapticLtd
    } else if !active && v_m >= t.theta_plus {
        PlasticityRegime::HeterosynapticLtd
    } else {
        PlasticityRegime::None
    }
}

/// One step of the exponential rate trace `omega += (-omega + phi) / tau`
#[inline]
pub fn update_rate_trace(omega: f64, phi: bool, tau: f64) -> f64 {
    omega + (-omega + f64::from(u8::from(phi))) / tau
}
