// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Periodic trigger source for forced weight updates.
//!
//! The device fires on block boundaries: at the end of a block ending at
//! absolute step `t`, it queues a trigger when `t` is a multiple of
//! `deliver_interval * min_delay`. The host drains the queue with
//! [`Node::take_update_triggers`] and hands each trigger to
//! [`force_update_all`](crate::force_update_all).

use rand::RngCore;
use tracing::{debug, trace};

use spikecore_npu_neural::{
    assert_update_range, DataLoggingRequest, LoggedSample, NeuralError, Node, NodeId, Result,
    Rport, SimulationContext, SpikeEvent, SpikeSink, StatusDict, Step,
};

pub const MODEL_NAME: &str = "updater_device";

#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterDevice {
    id: NodeId,
    /// Trigger period in min-delay blocks
    deliver_interval: i64,
    pending: Vec<f64>,
}

impl Default for UpdaterDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdaterDevice {
    pub fn new() -> Self {
        Self {
            id: NodeId::default(),
            deliver_interval: 1,
            pending: Vec::new(),
        }
    }

    pub fn deliver_interval(&self) -> i64 {
        self.deliver_interval
    }

    /// Number of triggers queued and not yet drained
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn period_steps(&self, ctx: &SimulationContext) -> Step {
        self.deliver_interval * ctx.min_delay
    }
}

impl Node for UpdaterDevice {
    fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    fn node_id(&self) -> NodeId {
        self.id
    }

    fn set_node_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn init_buffers(&mut self, _ctx: &SimulationContext) {
        self.pending.clear();
    }

    fn calibrate(&mut self, ctx: &SimulationContext) -> Result<()> {
        debug!(
            "[{}] node {} triggers every {} steps",
            MODEL_NAME,
            self.id,
            self.period_steps(ctx)
        );
        Ok(())
    }

    fn update(
        &mut self,
        ctx: &SimulationContext,
        from: Step,
        to: Step,
        _sink: &mut dyn SpikeSink,
        _rng: &mut dyn RngCore,
    ) {
        assert_update_range(ctx, from, to);
        let t = ctx.slice_origin + to;
        if t % self.period_steps(ctx) == 0 {
            let t_trig = ctx.resolution.steps_to_ms(t);
            trace!("[{}] node {} trigger at {}ms", MODEL_NAME, self.id, t_trig);
            self.pending.push(t_trig);
        }
    }

    // Incoming spikes carry no information for this device.
    fn handle_spike(&mut self, _ctx: &SimulationContext, _event: &SpikeEvent) {}

    fn handles_test_spike(&self, receptor: Rport) -> Result<Rport> {
        if receptor != 0 {
            return Err(NeuralError::unknown_receptor(receptor, MODEL_NAME));
        }
        Ok(0)
    }

    fn connect_logging_device(&mut self, request: &DataLoggingRequest) -> Result<Rport> {
        Err(NeuralError::UnknownRecordable {
            name: request.recordables.first().cloned().unwrap_or_default(),
            model: MODEL_NAME.to_string(),
        })
    }

    fn handle_data_logging_request(&mut self, port: Rport) -> Result<Vec<LoggedSample>> {
        Err(NeuralError::UnknownLoggingPort(port))
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        d.insert("model", MODEL_NAME);
        d.insert("deliver_interval", self.deliver_interval);
        d
    }

    fn set_status(&mut self, status: &StatusDict) -> Result<()> {
        let mut r = status.reader();
        let mut interval = self.deliver_interval;
        r.update_i64("deliver_interval", &mut interval)?;
        if interval < 1 {
            return Err(NeuralError::BadProperty(
                "deliver_interval must be at least one block.".to_string(),
            ));
        }
        r.skip_read_only(&["model"]);
        r.finish(MODEL_NAME)?;
        self.deliver_interval = interval;
        Ok(())
    }

    fn is_weight_updater(&self) -> bool {
        true
    }

    fn take_update_triggers(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikecore_npu_neural::OutgoingSpike;

    fn run_blocks(dev: &mut UpdaterDevice, ctx: &mut SimulationContext, blocks: usize) -> Vec<f64> {
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let mut triggers = Vec::new();
        for _ in 0..blocks {
            dev.update(ctx, 0, ctx.min_delay, &mut sink, &mut rng);
            triggers.extend(dev.take_update_triggers());
            ctx.advance_slice();
        }
        assert!(sink.is_empty());
        triggers
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut ctx = SimulationContext::default();
        let mut dev = UpdaterDevice::new();
        dev.set_status(&StatusDict::new().with("deliver_interval", 2)).unwrap();
        dev.init_buffers(&ctx);
        dev.calibrate(&ctx).unwrap();

        let triggers = run_blocks(&mut dev, &mut ctx, 6);
        assert_eq!(triggers.len(), 3);
        assert!((triggers[0] - 2.0).abs() < 1e-12);
        assert!((triggers[2] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_interval() {
        let mut dev = UpdaterDevice::new();
        assert!(dev.set_status(&StatusDict::new().with("deliver_interval", 0)).is_err());
        assert_eq!(dev.deliver_interval(), 1);
        dev.set_status(&dev.get_status()).unwrap();
    }

    #[test]
    fn test_receptors_and_recording() {
        let mut dev = UpdaterDevice::new();
        assert!(dev.is_weight_updater());
        assert_eq!(dev.handles_test_spike(0).unwrap(), 0);
        assert!(dev.handles_test_spike(1).is_err());
        let req = DataLoggingRequest::new(vec!["V_m".to_string()], 1);
        assert!(dev.connect_logging_device(&req).is_err());
    }
}
