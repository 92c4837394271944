// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-lane input ring buffer
//!
//! Each slot accumulates weighted contributions scheduled for one delivery
//! step. Reading a slot returns the sum and zeroes it, so contributions are
//! consumed exactly once and never leak into the next cycle of the ring.

/// Circular accumulator indexed by absolute step modulo its length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingBuffer {
    buffer: Vec<f64>,
}

impl RingBuffer {
    /// Create a zeroed buffer with `len` slots
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
        }
    }

    /// Resize to `len` slots and zero every slot
    pub fn resize(&mut self, len: usize) {
        self.buffer.clear();
        self.buffer.resize(len, 0.0);
    }

    /// Zero every slot, keeping the length
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|v| *v = 0.0);
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
            "ring buffer used before init_buffers sized it"
        );
        slot % self.buffer.len()
    }

    /// Accumulate `amount` into slot `slot mod len`
    #[inline]
    pub fn add_value(&mut self, slot: usize, amount: f64) {
        let idx = self.index(slot);
        self.buffer[idx] += amount;
    }

    /// Read the accumulated sum of a slot and reset it to zero
    #[inline]
    pub fn get_value(&mut self, slot: usize) -> f64 {
        let idx = self.index(slot);
        core::mem::take(&mut self.buffer[idx])
    }

    /// Read a slot without consuming it
    #[inline]
    pub fn peek(&self, slot: usize) -> f64 {
        self.buffer[self.index(slot)]
    }
}
