// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routing data shared by every connection type

use spikecore_npu_neural::{
    NeuralError, Node, NodeId, Result, Rport, SimulationContext, SpikeEvent, StatusDict,
    StatusReader, Step,
};

/// Target, receptor port and transmission delay of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionBase {
    target: NodeId,
    rport: Rport,
    delay_steps: Step,
}

impl ConnectionBase {
    pub fn new(target: NodeId, rport: Rport, delay_steps: Step) -> Result<Self> {
        check_delay(delay_steps)?;
        Ok(Self {
            target,
            rport,
            delay_steps,
        })
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn rport(&self) -> Rport {
        self.rport
    }

    pub fn delay_steps(&self) -> Step {
        self.delay_steps
    }

    /// Ask the target whether it accepts spikes on our receptor port
    ///
    /// Routing errors surface here, before any simulation step runs.
    pub fn check_connection(&self, target: &dyn Node) -> Result<Rport> {
        if target.node_id() != self.target {
            return Err(NeuralError::IncompatibleTarget {
                node: target.node_id(),
                model: target.model_name().to_string(),
                reason: "is not the target of this connection",
            });
        }
        target.handles_test_spike(self.rport)
    }

    /// Fill in the routing fields of an outgoing event
    pub fn stamp(&self, event: &mut SpikeEvent, weight: f64) {
        event.weight = weight;
        event.delay_steps = self.delay_steps;
        event.rport = self.rport;
    }

    /// Stamp `event` and hand it to `target`
    pub fn deliver(
        &self,
        ctx: &SimulationContext,
        event: &mut SpikeEvent,
        weight: f64,
        target: &mut dyn Node,
    ) {
        debug_assert_eq!(target.node_id(), self.target, "event delivered to wrong node");
        self.stamp(event, weight);
        target.handle_spike(ctx, event);
    }

    pub fn write(&self, d: &mut StatusDict) {
        d.insert("target", self.target.0);
        d.insert("receptor", self.rport as u64);
        d.insert("delay_steps", self.delay_steps);
    }

    pub fn read(&mut self, r: &mut StatusReader<'_>) -> Result<()> {
        let mut delay = self.delay_steps;
        r.update_i64("delay_steps", &mut delay)?;
        check_delay(delay)?;
        self.delay_steps = delay;
        // fixed once connected
        r.skip_read_only(&["target", "receptor"]);
        Ok(())
    }
}

fn check_delay(delay_steps: Step) -> Result<()> {
    if delay_steps < 1 {
        return Err(NeuralError::bad_value(
            "delay_steps",
            format!("delay must be at least one step, got {delay_steps}"),
        ));
    }
    Ok(())
}

/// Common surface of connection types
pub trait Connection {
    fn base(&self) -> &ConnectionBase;

    fn weight(&self) -> f64;

    /// Forward a presynaptic spike to the target node
    fn send(&mut self, ctx: &SimulationContext, event: &mut SpikeEvent, target: &mut dyn Node);

    fn get_status(&self) -> StatusDict;

    fn set_status(&mut self, status: &StatusDict) -> Result<()>;

    fn check_connection(&self, target: &dyn Node) -> Result<Rport> {
        self.base().check_connection(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_must_be_positive() {
        assert!(ConnectionBase::new(NodeId(1), 0, 0).is_err());
        assert!(ConnectionBase::new(NodeId(1), 0, 1).is_ok());
    }

    #[test]
    fn test_stamp_sets_routing_fields() {
        let base = ConnectionBase::new(NodeId(3), 21, 4).unwrap();
        let mut e = SpikeEvent::new(NodeId(1), 10);
        base.stamp(&mut e, 0.5);
        assert_eq!((e.weight, e.delay_steps, e.rport), (0.5, 4, 21));
        assert_eq!(e.delivery_step(), 13);
    }

    #[test]
    fn test_status_delay_update_validated() {
        let mut base = ConnectionBase::new(NodeId(3), 0, 4).unwrap();
        let d = StatusDict::new().with("delay_steps", 0);
        assert!(base.read(&mut d.reader()).is_err());
        assert_eq!(base.delay_steps(), 4);

        let d = StatusDict::new().with("delay_steps", 7).with("target", 99);
        let mut r = d.reader();
        base.read(&mut r).unwrap();
        r.finish("test").unwrap();
        assert_eq!(base.delay_steps(), 7);
        assert_eq!(base.target(), NodeId(3));
    }
}
