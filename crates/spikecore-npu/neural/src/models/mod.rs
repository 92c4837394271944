// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! Every model implements the [`Node`] capability trait so the host can
//! drive heterogeneous populations through `Box<dyn Node>`.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs` with `Parameters`/`State` structs
//! 2. Add a `static` [`RecordablesMap`](crate::recording::RecordablesMap)
//! 3. Implement `Node` (and `PostsynapticView` if plasticity rules read it)
//! 4. Add tests
//! 5. Export in `mod.rs`

pub mod bpid;
pub mod iaf_matco;
pub mod iaf_psc_exp;
pub mod traits;

// Re-export core types
pub use bpid::{safe_logistic, BpidKp2017, BpidParameters, BpidState, IntegrationType, ReceptorKind};
pub use iaf_matco::{IafMatco2018, IafMatcoParameters, IafMatcoState};
pub use iaf_psc_exp::{IafPscExp, IafPscExpParameters, IafPscExpState};
pub use traits::{assert_update_range, Node, NodeLookup, PostsynapticView};
