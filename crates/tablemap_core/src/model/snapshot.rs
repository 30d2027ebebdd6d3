//! Ordered field-name to value mapping.

use crate::model::value::FieldValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered mapping of a model's persistable field names to current values.
///
/// Entry order is the model's declared field order; it drives column order
/// in generated SQL and positional binding order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    entries: Vec<(&'static str, FieldValue)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends an entry, replacing the value when `name` is already present.
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Removes `name` and returns its value, keeping remaining order intact.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(key, _)| *key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn into_values(self) -> impl Iterator<Item = FieldValue> {
        self.entries.into_iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }
}

impl IntoIterator for Snapshot {
    type Item = (&'static str, FieldValue);
    type IntoIter = std::vec::IntoIter<(&'static str, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
