// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Events exchanged between nodes and the host's delivery subsystem

use super::ids::{NodeId, Rport, Step};

/// A spike travelling over a connection
///
/// `stamp` is the absolute step at which the sender emitted (origin + lag + 1),
/// `delay_steps` is filled in by the connection. The spike takes effect on
/// step `stamp + delay_steps - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeEvent {
    pub sender: NodeId,
    pub weight: f64,
    pub multiplicity: u32,
    pub rport: Rport,
    pub stamp: Step,
    pub delay_steps: Step,
}

impl SpikeEvent {
    pub fn new(sender: NodeId, stamp: Step) -> Self {
        Self {
            sender,
            weight: 1.0,
            multiplicity: 1,
            rport: 0,
            stamp,
            delay_steps: 1,
        }
    }

    /// Absolute step on which the receiver consumes this spike
    #[inline]
    pub fn delivery_step(&self) -> Step {
        self.stamp + self.delay_steps - 1
    }

    /// Delivery step relative to a block origin
    #[inline]
    pub fn rel_delivery_steps(&self, origin: Step) -> Step {
        self.delivery_step() - origin
    }

    /// Total weighted amplitude (weight × multiplicity)
    #[inline]
    pub fn weighted(&self) -> f64 {
        self.weight * self.multiplicity as f64
    }
}

/// A piecewise-constant current injected on a receptor channel
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentEvent {
    pub sender: NodeId,
    pub current: f64,
    pub weight: f64,
    pub rport: Rport,
    pub stamp: Step,
    pub delay_steps: Step,
}

impl CurrentEvent {
    pub fn new(sender: NodeId, current: f64, stamp: Step) -> Self {
        Self {
            sender,
            current,
            weight: 1.0,
            rport: 0,
            stamp,
            delay_steps: 1,
        }
    }

    #[inline]
    pub fn delivery_step(&self) -> Step {
        self.stamp + self.delay_steps - 1
    }
}

/// Connection request from a recording device
#[derive(Debug, Clone, PartialEq)]
pub struct DataLoggingRequest {
    /// Names of the quantities to sample
    pub recordables: Vec<String>,
    /// Sampling interval in steps (>= 1)
    pub interval_steps: Step,
}

impl DataLoggingRequest {
    pub fn new<S: Into<String>>(recordables: impl IntoIterator<Item = S>, interval_steps: Step) -> Self {
        Self {
            recordables: recordables.into_iter().map(Into::into).collect(),
            interval_steps,
        }
    }
}

/// A spike emitted by a node during `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingSpike {
    pub sender: NodeId,
    /// Offset of the emitting step within the current block
    pub lag: Step,
    /// Absolute spike time stamp in steps (origin + lag + 1)
    pub stamp: Step,
}

impl OutgoingSpike {
    /// Turn the emission into an event ready for a connection's `send`
    pub fn to_event(&self) -> SpikeEvent {
        SpikeEvent::new(self.sender, self.stamp)
    }
}

/// Receiver of spikes emitted during `update` (the host's delivery subsystem)
pub trait SpikeSink {
    fn send(&mut self, spike: OutgoingSpike);
}

impl SpikeSink for Vec<OutgoingSpike> {
    fn send(&mut self, spike: OutgoingSpike) {
        self.push(spike);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_step() {
        let mut e = SpikeEvent::new(NodeId(1), 10);
        e.delay_steps = 5;
        assert_eq!(e.delivery_step(), 14);
        assert_eq!(e.rel_delivery_steps(10), 4);
    }

    #[test]
    fn test_weighted_amplitude() {
        let mut e = SpikeEvent::new(NodeId(1), 0);
        e.weight = -2.5;
        e.multiplicity = 3;
        assert_eq!(e.weighted(), -7.5);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        sink.send(OutgoingSpike {
            sender: NodeId(3),
            lag: 2,
            stamp: 13,
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].to_event().stamp, 13);
    }
}
