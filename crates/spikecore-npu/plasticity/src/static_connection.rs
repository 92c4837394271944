// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static-weight connection for the binary stochastic units

use spikecore_npu_neural::{Result, SimulationContext, SpikeEvent, StatusDict, Node};

use crate::connection::{Connection, ConnectionBase};

pub const MODEL_NAME: &str = "kp_1994_connection";

/// Forwards spikes with a fixed weight
#[derive(Debug, Clone, PartialEq)]
pub struct KpConnection {
    base: ConnectionBase,
    weight: f64,
}

impl KpConnection {
    pub fn new(base: ConnectionBase) -> Self {
        Self { base, weight: 1.0 }
    }

    pub fn with_weight(base: ConnectionBase, weight: f64) -> Self {
        Self { base, weight }
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl Connection for KpConnection {
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn send(&mut self, ctx: &SimulationContext, event: &mut SpikeEvent, target: &mut dyn Node) {
        self.base.deliver(ctx, event, self.weight, target);
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        self.base.write(&mut d);
        d.insert("weight", self.weight);
        d
    }

    fn set_status(&mut self, status: &StatusDict) -> Result<()> {
        let mut r = status.reader();
        let mut base = self.base;
        base.read(&mut r)?;
        let mut weight = self.weight;
        r.update_f64("weight", &mut weight)?;
        r.finish(MODEL_NAME)?;
        self.base = base;
        self.weight = weight;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikecore_npu_neural::models::ReceptorKind;
    use spikecore_npu_neural::{BpidKp2017, NodeId};

    #[test]
    fn test_forwards_into_receptive_field() {
        let ctx = SimulationContext::default();
        let mut target = BpidKp2017::new();
        target.set_node_id(NodeId(2));
        target.init_buffers(&ctx);

        let rport = ReceptorKind::ReceptiveField.encode(0);
        let mut conn = KpConnection::with_weight(ConnectionBase::new(NodeId(2), rport, 1).unwrap(), 0.75);
        assert_eq!(conn.check_connection(&target), Ok(rport));

        let mut e = SpikeEvent::new(NodeId(1), 0);
        conn.send(&ctx, &mut e, &mut target);
        assert_eq!(e.weight, 0.75);
        assert_eq!(e.rport, rport);
    }

    #[test]
    fn test_unknown_receptor_at_connect_time() {
        let target = BpidKp2017::new();
        let conn = KpConnection::new(ConnectionBase::new(NodeId(0), 9, 1).unwrap());
        assert!(conn.check_connection(&target).is_err());
    }

    #[test]
    fn test_weight_status() {
        let mut conn = KpConnection::new(ConnectionBase::new(NodeId(0), 1, 1).unwrap());
        conn.set_status(&StatusDict::new().with("weight", -2.0)).unwrap();
        assert_eq!(conn.weight(), -2.0);
        assert_eq!(conn.get_status().get_f64("weight"), Some(-2.0));
        assert!(conn.set_status(&StatusDict::new().with("eta", 0.1)).is_err());
        assert_eq!(conn.weight(), -2.0);
    }
}
