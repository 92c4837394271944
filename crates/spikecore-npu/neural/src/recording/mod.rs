// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pull-based recording of model observables
//!
//! Each model type owns one static [`RecordablesMap`] naming the quantities a
//! recording device may sample. A [`DataLogger`] per node instance keeps the
//! connected devices and their buffered samples.

pub mod logger;
pub mod recordables;

pub use logger::{DataLogger, LoggedSample};
pub use recordables::{Accessor, Recordable, RecordablesMap};
