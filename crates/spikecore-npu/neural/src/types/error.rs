// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neuron/synapse configuration and connection checks
//!
//! Only configuration and routing problems are recoverable errors. Broken
//! invariants during a simulation step (non-finite activation, missing
//! calibration) are assertions.

use super::ids::{NodeId, Rport};

/// Errors reported synchronously by `set_status`, connection checks and lookups
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    /// A parameter combination violates a model constraint
    #[error("Bad property: {0}")]
    BadProperty(String),

    /// A single parameter is outside its valid range
    #[error("Bad value for parameter '{name}': {reason}")]
    BadParameterValue { name: String, reason: String },

    /// An event was addressed to a receptor port the model does not have
    #[error("Unknown receptor type {receptor} for model {model}")]
    UnknownReceptorType { receptor: Rport, model: String },

    /// A status dictionary contained keys the model did not consume
    #[error("Unaccessed status dictionary entries for model {model}: {keys:?}")]
    UnaccessedStatusKeys { model: String, keys: Vec<String> },

    /// A status dictionary entry had the wrong JSON type
    #[error("Status entry '{key}' has wrong type: expected {expected}")]
    StatusTypeMismatch { key: String, expected: &'static str },

    /// A logging device asked for a quantity the model cannot record
    #[error("Unknown recordable '{name}' for model {model}")]
    UnknownRecordable { name: String, model: String },

    /// A logging device port does not exist
    #[error("Unknown logging device port {0}")]
    UnknownLoggingPort(Rport),

    /// Node lookup failed
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node exists but does not provide the capability the caller needs
    #[error("Node {node} ({model}) is not compatible: {reason}")]
    IncompatibleTarget {
        node: NodeId,
        model: String,
        reason: &'static str,
    },

    /// A plasticity synapse was updated without an updater device assigned
    #[error("No weight updater assigned to synapse")]
    NoWeightUpdater,
}

pub type Result<T> = core::result::Result<T, NeuralError>;
pub type Error = NeuralError;

impl NeuralError {
    /// Shorthand for [`NeuralError::BadParameterValue`]
    pub fn bad_value(name: &str, reason: impl Into<String>) -> Self {
        NeuralError::BadParameterValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`NeuralError::UnknownReceptorType`]
    pub fn unknown_receptor(receptor: Rport, model: &str) -> Self {
        NeuralError::UnknownReceptorType {
            receptor,
            model: model.to_string(),
        }
    }
}
