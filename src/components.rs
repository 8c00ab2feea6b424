//! Registry of named, reusable OpenAPI components.
//!
//! Components are filed by bucket (`schemas`, `requestBodies`, ...) and name,
//! and referenced elsewhere as `#/components/<bucket>/<name>`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Build a `$ref` object pointing at a component.
pub fn reference(bucket: &str, name: &str) -> Value {
    json!({ "$ref": format!("#/components/{}/{}", bucket, name) })
}

/// Bucket → name → fragment.
///
/// Serializes as the `components` object of an OpenAPI document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Components(BTreeMap<String, Map<String, Value>>);

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, name: &str) -> Option<&Value> {
        self.0.get(bucket).and_then(|b| b.get(name))
    }

    pub fn contains(&self, bucket: &str, name: &str) -> bool {
        self.get(bucket, name).is_some()
    }

    /// Store a component, replacing any previous definition.
    pub fn define(&mut self, bucket: &str, name: &str, fragment: Value) {
        self.0
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), fragment);
    }

    /// Fold another registry into this one; its entries win on conflict.
    pub fn merge(&mut self, other: Components) {
        for (bucket, entries) in other.0 {
            let target = self.0.entry(bucket).or_default();
            for (name, fragment) in entries {
                target.insert(name, fragment);
            }
        }
    }

    /// A new registry holding this one's entries plus `other`'s.
    pub fn merged(&self, other: &Components) -> Components {
        let mut combined = self.clone();
        combined.merge(other.clone());
        combined
    }

    /// Total number of components across buckets.
    pub fn len(&self) -> usize {
        self.0.values().map(Map::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(bucket, entries)| (bucket.clone(), Value::Object(entries.clone())))
                .collect(),
        )
    }
}
