// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Key/value status protocol between models and the host
//!
//! A [`StatusDict`] is a flat JSON object. Models write their parameters and
//! state into one on `get_status`, and read updates from one on `set_status`
//! through a [`StatusReader`], which remembers which keys were consumed so
//! that misspelled or foreign keys are reported instead of silently ignored.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{NeuralError, Result};

/// Flat key/value dictionary carried across the status protocol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusDict {
    entries: Map<String, Value>,
}

impl StatusDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numeric entry, if present and numeric
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_bool)
    }

    /// Numeric array entry, if present and all elements numeric
    pub fn get_f64_vec(&self, key: &str) -> Option<Vec<f64>> {
        self.entries
            .get(key)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_f64).collect())
    }

    /// Merge another dictionary into this one (later entries win)
    pub fn extend(&mut self, other: StatusDict) {
        self.entries.extend(other.entries);
    }

    /// Start a tracked read for `set_status`
    pub fn reader(&self) -> StatusReader<'_> {
        StatusReader {
            dict: self,
            accessed: AHashSet::new(),
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.entries)
    }
}

impl From<Map<String, Value>> for StatusDict {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl TryFrom<Value> for StatusDict {
    type Error = NeuralError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(NeuralError::StatusTypeMismatch {
                key: "<root>".to_string(),
                expected: "object",
            }),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StatusDict {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Tracked view of a [`StatusDict`] used while applying an update
#[derive(Debug)]
pub struct StatusReader<'a> {
    dict: &'a StatusDict,
    accessed: AHashSet<String>,
}

impl<'a> StatusReader<'a> {
    /// Whether `key` is present (does not count as an access)
    pub fn known(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    /// Mark a key consumed without reading it through a typed accessor
    pub fn mark_accessed(&mut self, key: &str) {
        if self.dict.contains_key(key) {
            self.accessed.insert(key.to_string());
        }
    }

    /// Accept read-only entries echoed back from `get_status` without applying them
    pub fn skip_read_only(&mut self, keys: &[&str]) {
        keys.iter().for_each(|k| self.mark_accessed(k));
    }

    /// Raw value access; marks the key consumed
    pub fn value(&mut self, key: &str) -> Option<&'a Value> {
        let v = self.dict.get(key)?;
        self.accessed.insert(key.to_string());
        Some(v)
    }

    /// Overwrite `target` if `key` is present. Returns whether it was.
    pub fn update_f64(&mut self, key: &str, target: &mut f64) -> Result<bool> {
        match self.value(key) {
            None => Ok(false),
            Some(v) => {
                *target = v.as_f64().ok_or_else(|| mismatch(key, "number"))?;
                Ok(true)
            }
        }
    }

    pub fn update_i64(&mut self, key: &str, target: &mut i64) -> Result<bool> {
        match self.value(key) {
            None => Ok(false),
            Some(v) => {
                *target = as_integral(v).ok_or_else(|| mismatch(key, "integer"))?;
                Ok(true)
            }
        }
    }

    pub fn update_bool(&mut self, key: &str, target: &mut bool) -> Result<bool> {
        match self.value(key) {
            None => Ok(false),
            Some(v) => {
                *target = v.as_bool().ok_or_else(|| mismatch(key, "bool"))?;
                Ok(true)
            }
        }
    }

    pub fn update_f64_vec(&mut self, key: &str, target: &mut Vec<f64>) -> Result<bool> {
        match self.value(key) {
            None => Ok(false),
            Some(v) => {
                *target = v
                    .as_array()
                    .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
                    .ok_or_else(|| mismatch(key, "array of numbers"))?;
                Ok(true)
            }
        }
    }

    /// Fail if any entry was not consumed by the model
    pub fn finish(self, model: &str) -> Result<()> {
        let mut unaccessed: Vec<String> = self
            .dict
            .keys()
            .filter(|k| !self.accessed.contains(k.as_str()))
            .cloned()
            .collect();
        if unaccessed.is_empty() {
            return Ok(());
        }
        unaccessed.sort();
        Err(NeuralError::UnaccessedStatusKeys {
            model: model.to_string(),
            keys: unaccessed,
        })
    }
}

fn mismatch(key: &str, expected: &'static str) -> NeuralError {
    NeuralError::StatusTypeMismatch {
        key: key.to_string(),
        expected,
    }
}

fn as_integral(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_present_and_absent() {
        let d = StatusDict::new().with("tau_m", 20.0);
        let mut r = d.reader();
        let mut tau_m = 10.0;
        let mut c_m = 250.0;
        assert!(r.update_f64("tau_m", &mut tau_m).unwrap());
        assert!(!r.update_f64("C_m", &mut c_m).unwrap());
        assert_eq!(tau_m, 20.0);
        assert_eq!(c_m, 250.0);
        assert!(r.finish("test").is_ok());
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        let d = StatusDict::new().with("interval", 3.0).with("bad", 2.5);
        let mut r = d.reader();
        let mut v = 0;
        assert!(r.update_i64("interval", &mut v).unwrap());
        assert_eq!(v, 3);
        assert!(r.update_i64("bad", &mut v).is_err());
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let d = StatusDict::new().with("V_m", "high");
        let mut v = 0.0;
        let err = d.reader().update_f64("V_m", &mut v).unwrap_err();
        assert_eq!(
            err,
            NeuralError::StatusTypeMismatch {
                key: "V_m".into(),
                expected: "number"
            }
        );
    }

    #[test]
    fn test_unaccessed_keys_are_errors() {
        let d = StatusDict::new().with("tau_m", 1.0).with("tau_mm", 2.0);
        let mut r = d.reader();
        let mut tau = 0.0;
        r.update_f64("tau_m", &mut tau).unwrap();
        match r.finish("iaf_psc_exp") {
            Err(NeuralError::UnaccessedStatusKeys { keys, .. }) => assert_eq!(keys, vec!["tau_mm"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_vector_entries() {
        let d = StatusDict::new().with("phis", json!([0.1, 0.2]));
        assert_eq!(d.get_f64_vec("phis"), Some(vec![0.1, 0.2]));
        let mut phis = Vec::new();
        d.reader().update_f64_vec("phis", &mut phis).unwrap();
        assert_eq!(phis, vec![0.1, 0.2]);
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let d: StatusDict = StatusDict::try_from(json!({"I_e": 1.5, "recordables": ["V_m"]})).unwrap();
        assert_eq!(d.get_f64("I_e"), Some(1.5));
        assert!(StatusDict::try_from(json!([1, 2])).is_err());
        assert_eq!(serde_json::to_value(&d).unwrap()["I_e"], json!(1.5));
    }
}
