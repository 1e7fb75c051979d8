use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::table::TableConfig;

/// A typed key segment.
///
/// Numbers are kept as `f64`, so a segment that fails to parse is carried as `NaN` rather than
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    String(String),
    Number(f64),
}

impl KeyValue {
    /// Reads a key segment out of an item attribute.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(KeyValue::String(s.clone())),
            Value::Number(n) => n.as_f64().map(KeyValue::Number),
            _ => None,
        }
    }

    /// Converts to an item attribute. Non-finite numbers have no JSON form and become `null`.
    pub fn to_value(&self) -> Value {
        match self {
            KeyValue::String(s) => Value::String(s.clone()),
            KeyValue::Number(n) => number_to_value(*n),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::String(s) => Some(s),
            KeyValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KeyValue::Number(n) => Some(*n),
            KeyValue::String(_) => None,
        }
    }

    /// Total order used for sort keys: numbers before strings, numbers by `f64::total_cmp`,
    /// strings bytewise.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Number(a), KeyValue::Number(b)) => a.total_cmp(b),
            (KeyValue::String(a), KeyValue::String(b)) => a.cmp(b),
            (KeyValue::Number(_), KeyValue::String(_)) => Ordering::Less,
            (KeyValue::String(_), KeyValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::String(s) => f.write_str(s),
            KeyValue::Number(n) if n.is_nan() => f.write_str("NaN"),
            KeyValue::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            KeyValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        KeyValue::Number(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Number(value as f64)
    }
}

/// Integral values within the exactly-representable range stay integers in JSON.
fn number_to_value(n: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Store-native key: attribute name to scalar.
pub type Key = BTreeMap<String, KeyValue>;

/// A decoded identifier: the partition segment and, for sort-key tables, the sort segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedKey {
    pub partition_key: KeyValue,
    pub sort_key: Option<KeyValue>,
}

impl TypedKey {
    pub fn partition(partition_key: impl Into<KeyValue>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    pub fn composite(partition_key: impl Into<KeyValue>, sort_key: impl Into<KeyValue>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: Some(sort_key.into()),
        }
    }

    /// Names the segments after the table's key attributes.
    ///
    /// A sort segment on a table without a sort key is dropped.
    pub fn to_key(&self, table: &TableConfig) -> Key {
        let mut key = Key::new();
        key.insert(
            table.partition_key.name.clone(),
            self.partition_key.clone(),
        );
        if let (Some(sort_key), Some(value)) = (&table.sort_key, &self.sort_key) {
            key.insert(sort_key.name.clone(), value.clone());
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::KeyAttribute;
    use serde_json::json;

    #[test]
    fn test_display_number() {
        assert_eq!(KeyValue::Number(1570354849343.0).to_string(), "1570354849343");
        assert_eq!(KeyValue::Number(1.5).to_string(), "1.5");
        assert_eq!(KeyValue::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(KeyValue::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_to_value_keeps_integers() {
        assert_eq!(KeyValue::Number(42.0).to_value(), json!(42));
        assert_eq!(KeyValue::Number(0.25).to_value(), json!(0.25));
        assert_eq!(KeyValue::Number(f64::NAN).to_value(), Value::Null);
    }

    #[test]
    fn test_total_cmp() {
        let mut values = vec![
            KeyValue::from("b"),
            KeyValue::Number(10.0),
            KeyValue::from("a"),
            KeyValue::Number(2.0),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                KeyValue::Number(2.0),
                KeyValue::Number(10.0),
                KeyValue::from("a"),
                KeyValue::from("b"),
            ]
        );
    }

    #[test]
    fn test_to_key_drops_sort_segment_without_sort_key() {
        let table = TableConfig::new("Users", "users", KeyAttribute::string("id"));
        let key = TypedKey::composite("u1", "extra").to_key(&table);

        assert_eq!(key.len(), 1);
        assert_eq!(key.get("id"), Some(&KeyValue::from("u1")));
    }
}
