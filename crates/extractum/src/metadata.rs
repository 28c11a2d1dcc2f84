//! Document metadata.
//!
//! Backends collect properties into a [`MetadataBuilder`], which may hold
//! several values per key. [`MetadataBuilder::build`] collapses each key into a
//! single comma-joined value, so keys are unique inside a [`Metadata`] and the
//! insertion order of first occurrence is kept.

use indexmap::IndexMap;
use serde::Serialize;

/// Separator used when a property has more than one value.
pub const VALUE_SEPARATOR: &str = ",";

/// Ordered, read-only key/value document properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: IndexMap<String, String>,
}

impl Metadata {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key at position `index`.
    pub fn key(&self, index: usize) -> Option<&str> {
        self.get(index).map(|(key, _)| key)
    }

    /// Value at position `index`, matching [`Metadata::key`] for the same index.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.get(index).map(|(_, value)| value)
    }

    /// Key/value pair at position `index`.
    pub fn get(&self, index: usize) -> Option<(&str, &str)> {
        self.entries
            .get_index(index)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Value for `key`, if present.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serialize to a JSON object, preserving order.
    pub fn to_json(&self) -> String {
        // A map of strings cannot fail to serialize.
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Multi-valued accumulator for document properties.
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    entries: IndexMap<String, Vec<String>>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `key`. Blank values are ignored.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.entries.entry(key.into()).or_default().push(value.to_string());
        }
        self
    }

    /// Append a value for `key` when one is present.
    pub fn add_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.add(key, value);
        }
        self
    }

    /// Replace every value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.entries.shift_remove(&key);
        self.add(key, value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn build(self) -> Metadata {
        Metadata {
            entries: self
                .entries
                .into_iter()
                .map(|(key, values)| (key, values.join(VALUE_SEPARATOR)))
                .collect(),
        }
    }
}
