// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-model table of recordable quantities
//!
//! Tables are plain `static` slices of named accessor functions, built at
//! compile time. There is no registration step and no shared mutable state.

/// Pure read accessor over a model's parameters and state
pub type Accessor<P, S> = fn(&P, &S) -> f64;

/// One named observable
pub struct Recordable<P: 'static, S: 'static> {
    pub name: &'static str,
    pub accessor: Accessor<P, S>,
}

/// Name -> accessor table for one model type
pub struct RecordablesMap<P: 'static, S: 'static> {
    entries: &'static [Recordable<P, S>],
}

impl<P: 'static, S: 'static> RecordablesMap<P, S> {
    pub const fn new(entries: &'static [Recordable<P, S>]) -> Self {
        Self { entries }
    }

    /// Look up an accessor by name
    pub fn get(&self, name: &str) -> Option<Accessor<P, S>> {
        self.entries
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.accessor)
    }

    /// Recordable names in table order (the `recordables` status entry)
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
