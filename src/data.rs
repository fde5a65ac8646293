use crate::error::FlattenError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Ordered, case-insensitive property set attached to every event.
///
/// Keys are compared after lower-casing. Inserting a key that is already
/// present (in any casing) replaces the value in place: the entry keeps its
/// original position and its first-seen spelling. Iteration follows
/// insertion order so rendering is deterministic.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

impl EventData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten any serializable value into a fresh property set.
    ///
    /// See [`flatten`] for the path rules.
    pub fn from_serialize<T>(values: &T) -> Result<Self, FlattenError>
    where
        T: Serialize + ?Sized,
    {
        let mut data = Self::new();
        data.add_values(values)?;
        Ok(data)
    }

    /// Flatten `values` and merge the leaves into this set, later keys
    /// overwriting earlier ones.
    pub fn add_values<T>(&mut self, values: &T) -> Result<(), FlattenError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(values)?;
        self.add_value(&value);
        Ok(())
    }

    /// Merge the flattened leaves of an already-serialized value.
    ///
    /// Use [`merge`](EventData::merge) to copy another set verbatim.
    pub fn add_value(&mut self, value: &Value) {
        self.extend(flatten(value));
    }

    /// Insert or replace a property. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let normalized = normalize(&key);
        if let Some(&pos) = self.index.get(&normalized) {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }
        self.index.insert(normalized, self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Insert a property only when no property with that key exists yet.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.insert(key, value);
        }
    }

    /// Apply every entry of `other` over this set.
    pub fn merge(&mut self, other: EventData) {
        self.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index
            .get(&normalize(key))
            .map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&normalize(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for EventData {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> Extend<(K, V)> for EventData
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EventData
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        data.extend(iter);
        data
    }
}

impl IntoIterator for EventData {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Flatten a serialized value into `(path, leaf)` pairs.
///
/// Only objects contribute: each member becomes a path, nested objects
/// extend it with `.Child` and arrays with `[index]`. Any other top-level
/// value (scalar, array, `null`) produces nothing. Empty objects and arrays
/// produce no leaves. There is no depth limit.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut leaves = Vec::new();
    if let Value::Object(members) = value {
        for (name, member) in members {
            flatten_member(name.clone(), member, &mut leaves);
        }
    }
    leaves
}

/// Flatten a value that sits at `path`, writing every leaf into `leaves`.
pub(crate) fn flatten_member(path: String, value: &Value, leaves: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(members) => {
            for (name, member) in members {
                flatten_member(format!("{path}.{name}"), member, leaves);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_member(format!("{path}[{i}]"), item, leaves);
            }
        }
        leaf => leaves.push((path, leaf.clone())),
    }
}
