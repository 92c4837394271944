// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identifiers used by the event protocol

use core::fmt;
use serde::{Deserialize, Serialize};

/// Host-assigned node identifier (neurons and devices share one id space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Receiver-side port selecting an input channel of the target node
pub type Rport = usize;

/// Simulation step index (absolute or relative, depending on context)
pub type Step = i64;
