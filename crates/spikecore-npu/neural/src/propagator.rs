// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Exact Propagators for Linear Sub-threshold Dynamics
//!
//! For a current-based neuron with exponential synaptic currents
//!
//! ```text
//! dI/dt = -I / tau_s
//! dV/dt = -V / tau_m + I / C
//! ```
//!
//! one grid step `h` is solved analytically by the lower-triangular matrix
//! exponential:
//!
//! ```text
//! P11 = exp(-h/tau_s)                                   (current decay)
//! P22 = exp(-h/tau_m)                                   (membrane decay)
//! P21 = tau_s*tau_m / (C*(tau_m - tau_s)) * (P22 - P11)  (current -> membrane)
//! P20 = tau_m/C * (1 - P22)                             (constant current)
//! ```
//!
//! `P21` has a removable singularity at `tau_s == tau_m`, where it equals
//! `h/C * exp(-h/tau_m)`. Near the singularity the difference `P22 - P11`
//! cancels catastrophically, so it is evaluated with `expm1` and replaced by
//! the singular limit whenever the regular form is no better than a
//! second-order expansion around it.

use tracing::warn;

/// Relative distance below which `tau_s` and `tau_m` are treated as equal
pub const SINGULARITY_REL_TOLERANCE: f64 = 1e-8;

/// How the linear sub-threshold system is stepped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationScheme {
    /// Matrix-exponential (exact) propagators
    #[default]
    Exact,
    /// First-order forward Euler approximation
    ForwardEuler,
}

impl IntegrationScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationScheme::Exact => "exact",
            IntegrationScheme::ForwardEuler => "forward_euler",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(IntegrationScheme::Exact),
            "forward_euler" => Some(IntegrationScheme::ForwardEuler),
            _ => None,
        }
    }
}

/// Decay factor of a first-order linear system over one step
#[inline]
pub fn decay(h: f64, tau: f64) -> f64 {
    assert!(h > 0.0, "propagator requested for non-positive step size {h}");
    (-h / tau).exp()
}

/// Transfer coefficient from a synaptic current (`tau_syn`) to the membrane (`tau_m`, `c_m`)
pub fn propagator_21(tau_syn: f64, tau_m: f64, c_m: f64, h: f64) -> f64 {
    assert!(h > 0.0, "propagator requested for non-positive step size {h}");

    let p22 = (-h / tau_m).exp();
    let singular = h / c_m * p22;

    let rel = (tau_m - tau_syn).abs() / tau_m.abs().max(tau_syn.abs());
    if tau_m == tau_syn || rel < SINGULARITY_REL_TOLERANCE {
        return singular;
    }

    // tau_s*tau_m/(C*(tau_m - tau_s)) * exp(-h/tau_s) * expm1(h/tau_s - h/tau_m)
    let regular = -tau_m / (c_m * (1.0 - tau_m / tau_syn))
        * (-h / tau_syn).exp()
        * (h * (1.0 / tau_syn - 1.0 / tau_m)).exp_m1();

    // second-order term of the expansion around tau_syn == tau_m
    let linear = 1.0 / (2.0 * c_m * tau_m * tau_m) * h * h * (tau_syn - tau_m) * p22;

    if !regular.is_finite()
        || ((tau_m - tau_syn).abs() < 0.1 && (regular - singular).abs() > 2.0 * linear.abs())
    {
        warn!(
            "tau_syn={} and tau_m={} are numerically indistinguishable; using singular propagator",
            tau_syn, tau_m
        );
        return singular;
    }
    regular
}

/// Constant-current propagator `tau_m/C * (1 - exp(-h/tau_m))`
#[inline]
pub fn propagator_20(tau_m: f64, c_m: f64, h: f64) -> f64 {
    assert!(h > 0.0, "propagator requested for non-positive step size {h}");
    -tau_m / c_m * (-h / tau_m).exp_m1()
}

/// Cached coefficients for a neuron with separate excitatory and inhibitory currents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpPropagators {
    pub p11_ex: f64,
    pub p11_in: f64,
    pub p22: f64,
    pub p21_ex: f64,
    pub p21_in: f64,
    pub p20: f64,
}

impl Default for ExpPropagators {
    /// Identity propagators (no evolution); replaced on calibration
    fn default() -> Self {
        Self {
            p11_ex: 1.0,
            p11_in: 1.0,
            p22: 1.0,
            p21_ex: 0.0,
            p21_in: 0.0,
            p20: 0.0,
        }
    }
}

impl ExpPropagators {
    /// Compute all coefficients for step `h`
    pub fn compute(
        tau_m: f64,
        c_m: f64,
        tau_ex: f64,
        tau_in: f64,
        h: f64,
        scheme: IntegrationScheme,
    ) -> Self {
        assert!(h > 0.0, "propagator requested for non-positive step size {h}");
        match scheme {
            IntegrationScheme::Exact => Self {
                p11_ex: decay(h, tau_ex),
                p11_in: decay(h, tau_in),
                p22: decay(h, tau_m),
                p21_ex: propagator_21(tau_ex, tau_m, c_m, h),
                p21_in: propagator_21(tau_in, tau_m, c_m, h),
                p20: propagator_20(tau_m, c_m, h),
            },
            IntegrationScheme::ForwardEuler => Self {
                p11_ex: 1.0 - h / tau_ex,
                p11_in: 1.0 - h / tau_in,
                p22: 1.0 - h / tau_m,
                p21_ex: h / c_m,
                p21_in: h / c_m,
                p20: h / c_m,
            },
        }
    }
}
