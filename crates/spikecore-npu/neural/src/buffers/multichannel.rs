// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multi-lane input ring buffer
//!
//! One slot per delivery step, each slot holding `N` independent lanes
//! (e.g. excitatory spikes, inhibitory spikes and two raw current channels).
//! Lanes share the slot indexing so a model can read every lane of a step and
//! clear them together.

/// Ring buffer of `N`-lane slots
#[derive(Debug, Clone, PartialEq)]
pub struct MultiChannelBuffer<const N: usize> {
    buffer: Vec<[f64; N]>,
}

impl<const N: usize> Default for MultiChannelBuffer<N> {
    fn default() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl<const N: usize> MultiChannelBuffer<N> {
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![[0.0; N]; len],
        }
    }

    /// Resize to `len` slots and zero every lane
    pub fn resize(&mut self, len: usize) {
        self.buffer.clear();
        self.buffer.resize(len, [0.0; N]);
    }

    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = [0.0; N]);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    fn index(&self, slot: usize) -> usize {
        assert!(
            !self.buffer.is_empty(),
            "multi-channel buffer used before init_buffers sized it"
        );
        slot % self.buffer.len()
    }

    /// Accumulate `amount` into lane `channel` of slot `slot mod len`
    #[inline]
    pub fn add_value(&mut self, slot: usize, channel: usize, amount: f64) {
        debug_assert!(channel < N, "channel {channel} out of range (N = {N})");
        let idx = self.index(slot);
        self.buffer[idx][channel] += amount;
    }

    /// Read-and-reset a single lane
    #[inline]
    pub fn get_value(&mut self, slot: usize, channel: usize) -> f64 {
        let idx = self.index(slot);
        core::mem::take(&mut self.buffer[idx][channel])
    }

    /// Copy of every lane of a slot; the slot is left untouched
    #[inline]
    pub fn get_values_all_channels(&self, slot: usize) -> [f64; N] {
        self.buffer[self.index(slot)]
    }

    /// Zero every lane of one slot
    #[inline]
    pub fn reset_values_all_channels(&mut self, slot: usize) {
        let idx = self.index(slot);
        self.buffer[idx] = [0.0; N];
    }
}
