use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Ordered attribute map whose values may be undefined.
///
/// An undefined attribute (`None`) is skipped by every expression builder; a defined `null` is a
/// real value. Iteration follows insertion order, and re-inserting a name keeps its original
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, Option<Value>)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a serialisable struct, treating `null` fields as undefined.
    ///
    /// This is the natural shape for partial updates: `Option` fields left as `None` are not
    /// touched.
    pub fn from_partial<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?
        {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| (name, (!value.is_null()).then_some(value)))
                .collect()),
            other => Err(StoreError::Serialization(format!(
                "attributes must serialise to an object, got {other}"
            ))
            .into()),
        }
    }

    /// Sets an attribute, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Some(value.into()));
        self
    }

    pub fn with_undefined(mut self, name: impl Into<String>) -> Self {
        self.insert(name, None);
        self
    }

    /// Defined attributes, in insertion order.
    pub fn defined(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.as_str(), v)))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Number of defined attributes.
    pub fn len(&self) -> usize {
        self.defined().count()
    }

    /// True when no attribute is defined.
    pub fn is_empty(&self) -> bool {
        self.defined().next().is_none()
    }
}

impl FromIterator<(String, Option<Value>)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl From<Map<String, Value>> for AttributeMap {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Some(v))).collect()
    }
}
