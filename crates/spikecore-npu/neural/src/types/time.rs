// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation time grid and the per-call view of the host scheduler
//!
//! The host advances time in blocks of `min_delay` steps. Each call into a
//! node receives a [`SimulationContext`] describing the grid (`h`), the delay
//! bounds that size the ring buffers, and the origin of the current block.

use super::error::{NeuralError, Result};
use super::ids::Step;

/// Step size of the global time grid in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    h_ms: f64,
}

impl Resolution {
    /// Create a resolution, rejecting non-positive or non-finite step sizes
    pub fn new(h_ms: f64) -> Result<Self> {
        if !(h_ms.is_finite() && h_ms > 0.0) {
            return Err(NeuralError::bad_value(
                "resolution",
                format!("step size must be strictly positive, got {h_ms}"),
            ));
        }
        Ok(Self { h_ms })
    }

    /// Step size in ms
    #[inline]
    pub fn ms(&self) -> f64 {
        self.h_ms
    }

    /// Convert a duration in ms to the nearest number of whole steps
    #[inline]
    pub fn ms_to_steps(&self, ms: f64) -> Step {
        (ms / self.h_ms).round() as Step
    }

    #[inline]
    pub fn steps_to_ms(&self, steps: Step) -> f64 {
        steps as f64 * self.h_ms
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self { h_ms: 0.1 }
    }
}

/// The host's view of the simulation clock, handed to every node call
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationContext {
    pub resolution: Resolution,
    /// Minimum connection delay in steps (length of one update block)
    pub min_delay: Step,
    /// Maximum connection delay in steps
    pub max_delay: Step,
    /// Absolute step at which the current block starts
    pub slice_origin: Step,
}

impl SimulationContext {
    pub fn new(resolution: Resolution, min_delay: Step, max_delay: Step) -> Result<Self> {
        if min_delay < 1 {
            return Err(NeuralError::bad_value(
                "min_delay",
                format!("must be at least one step, got {min_delay}"),
            ));
        }
        if max_delay < min_delay {
            return Err(NeuralError::bad_value(
                "max_delay",
                format!("must not be smaller than min_delay ({min_delay}), got {max_delay}"),
            ));
        }
        Ok(Self {
            resolution,
            min_delay,
            max_delay,
            slice_origin: 0,
        })
    }

    /// Number of slots every input ring buffer needs
    #[inline]
    pub fn buffer_len(&self) -> usize {
        (self.min_delay + self.max_delay) as usize
    }

    /// Ring-buffer slot for an absolute step
    #[inline]
    pub fn slot(&self, step: Step) -> usize {
        step.rem_euclid(self.buffer_len() as Step) as usize
    }

    /// Ring-buffer slot for `lag` steps into the current block
    #[inline]
    pub fn slot_for_lag(&self, lag: Step) -> usize {
        self.slot(self.slice_origin + lag)
    }

    /// Move the block origin forward by one min-delay block
    pub fn advance_slice(&mut self) {
        self.slice_origin += self.min_delay;
    }

    /// Absolute time in ms of the end of step `lag` in the current block
    #[inline]
    pub fn spike_time_ms(&self, lag: Step) -> f64 {
        self.resolution.steps_to_ms(self.slice_origin + lag + 1)
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            min_delay: 10,
            max_delay: 100,
            slice_origin: 0,
        }
    }
}
