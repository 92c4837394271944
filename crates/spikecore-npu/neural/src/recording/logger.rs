// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-node sampler serving connected recording devices

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::recordables::{Accessor, RecordablesMap};
use crate::types::{DataLoggingRequest, NeuralError, Result, Rport, Step};

/// One sampled row: the values of a device's recordables at `step`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSample {
    pub step: Step,
    pub values: Vec<f64>,
}

struct LoggingDevice<P: 'static, S: 'static> {
    names: Vec<String>,
    accessors: Vec<Accessor<P, S>>,
    interval_steps: Step,
    data: Vec<LoggedSample>,
}

/// Connected devices of one node instance and their pending samples
pub struct DataLogger<P: 'static, S: 'static> {
    devices: Vec<LoggingDevice<P, S>>,
}

impl<P: 'static, S: 'static> Default for DataLogger<P, S> {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
        }
    }
}

impl<P: 'static, S: 'static> std::fmt::Debug for DataLogger<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLogger")
            .field("devices", &self.devices.len())
            .finish()
    }
}

impl<P: 'static, S: 'static> Clone for DataLogger<P, S> {
    /// Copies of a node start without connected devices
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<P: 'static, S: 'static> DataLogger<P, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device; returns the port its data is served on
    pub fn connect(
        &mut self,
        request: &DataLoggingRequest,
        map: &RecordablesMap<P, S>,
        model: &str,
    ) -> Result<Rport> {
        if request.interval_steps < 1 {
            return Err(NeuralError::bad_value(
                "interval",
                format!("sampling interval must be at least one step, got {}", request.interval_steps),
            ));
        }
        let accessors = request
            .recordables
            .iter()
            .map(|name| {
                map.get(name).ok_or_else(|| NeuralError::UnknownRecordable {
                    name: name.clone(),
                    model: model.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.devices.push(LoggingDevice {
            names: request.recordables.clone(),
            accessors,
            interval_steps: request.interval_steps,
            data: Vec::new(),
        });
        let port = self.devices.len() - 1;
        debug!(
            "[{}] logging device connected on port {} recording {:?}",
            model, port, request.recordables
        );
        Ok(port)
    }

    /// Sample every device whose interval divides `step`
    pub fn record_data(&mut self, step: Step, params: &P, state: &S) {
        for device in &mut self.devices {
            if step.rem_euclid(device.interval_steps) != 0 {
                continue;
            }
            let values = device.accessors.iter().map(|acc| acc(params, state)).collect();
            device.data.push(LoggedSample { step, values });
        }
    }

    /// Drain the samples buffered for `port`
    pub fn take_data(&mut self, port: Rport) -> Result<Vec<LoggedSample>> {
        self.devices
            .get_mut(port)
            .map(|d| std::mem::take(&mut d.data))
            .ok_or(NeuralError::UnknownLoggingPort(port))
    }

    /// Names recorded on `port`, in sample column order
    pub fn recordables(&self, port: Rport) -> Option<&[String]> {
        self.devices.get(port).map(|d| d.names.as_slice())
    }

    /// Drop buffered samples, keeping the connections
    pub fn reset(&mut self) {
        self.devices.iter_mut().for_each(|d| d.data.clear());
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
