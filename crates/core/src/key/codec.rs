use serde_json::Map;
use serde_json::Value;

use crate::error::{AccessError, Result};
use crate::table::{KeyType, TableConfig};

use super::{Key, KeyValue, TypedKey};

/// Parses a numeric key segment.
///
/// Surrounding whitespace is ignored and a blank segment reads as `0`. Unsigned `0x`, `0o` and
/// `0b` literals are read in their radix. Anything else that is not a decimal number (or
/// `Infinity`) becomes `NaN`.
pub fn parse_number(segment: &str) -> f64 {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(value) = parse_radix_literal(trimmed) {
        return value;
    }

    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    if unsigned
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }

    trimmed.parse().unwrap_or(f64::NAN)
}

fn parse_radix_literal(literal: &str) -> Option<f64> {
    let radix = match literal.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &literal[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let value = digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|digit| acc * f64::from(radix) + f64::from(digit))
    });
    Some(value.unwrap_or(f64::NAN))
}

/// Casts a raw segment to the key type.
pub fn cast(segment: &str, key_type: KeyType) -> KeyValue {
    match key_type {
        KeyType::String => KeyValue::String(segment.to_string()),
        KeyType::Number => KeyValue::Number(parse_number(segment)),
    }
}

/// Splits a composite identifier into typed key segments.
///
/// Sort-key tables split at the first separator; the sort segment keeps any further
/// separators. A missing separator is an error.
pub fn decode(id: &str, table: &TableConfig) -> Result<TypedKey> {
    let Some(sort_key) = &table.sort_key else {
        return Ok(TypedKey {
            partition_key: cast(id, table.partition_key.key_type),
            sort_key: None,
        });
    };

    let (partition, sort) =
        id.split_once(table.separator.as_str())
            .ok_or_else(|| AccessError::MalformedCompositeKey {
                id: id.to_string(),
                separator: table.separator.clone(),
            })?;

    Ok(TypedKey {
        partition_key: cast(partition, table.partition_key.key_type),
        sort_key: Some(cast(sort, sort_key.key_type)),
    })
}

/// Joins typed key segments back into an identifier.
pub fn encode(key: &TypedKey, table: &TableConfig) -> String {
    match &key.sort_key {
        Some(sort) => format!("{}{}{}", key.partition_key, table.separator, sort),
        None => key.partition_key.to_string(),
    }
}

/// Decodes an identifier straight into a store-native key.
pub fn to_key(id: &str, table: &TableConfig) -> Result<Key> {
    Ok(decode(id, table)?.to_key(table))
}

/// Re-encodes a store-native key (e.g. a continuation key) as an identifier.
///
/// Missing attributes are skipped: a key without its sort attribute encodes to the partition
/// segment alone.
pub fn combine_keys(key: &Key, table: &TableConfig) -> String {
    let mut id = key
        .get(&table.partition_key.name)
        .map(ToString::to_string)
        .unwrap_or_default();
    if let Some(sort) = table
        .sort_key
        .as_ref()
        .and_then(|sort_key| key.get(&sort_key.name))
    {
        id.push_str(&table.separator);
        id.push_str(&sort.to_string());
    }
    id
}

/// Extracts the store-native key of an item, if it carries its key attributes.
pub fn key_of_item(item: &Map<String, Value>, table: &TableConfig) -> Option<Key> {
    let mut key = Key::new();
    let partition = KeyValue::from_value(item.get(&table.partition_key.name)?)?;
    key.insert(table.partition_key.name.clone(), partition);
    if let Some(sort_key) = &table.sort_key {
        let sort = KeyValue::from_value(item.get(&sort_key.name)?)?;
        key.insert(sort_key.name.clone(), sort);
    }
    Some(key)
}

/// Rebuilds the identifier of an item from its key attributes.
pub fn id_of_item(item: &Map<String, Value>, table: &TableConfig) -> Option<String> {
    key_of_item(item, table).map(|key| combine_keys(&key, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::KeyAttribute;
    use serde_json::json;

    fn products() -> TableConfig {
        TableConfig::new("Products", "products", KeyAttribute::string("id"))
            .with_sort_key(KeyAttribute::number("timestamp"))
    }

    fn users() -> TableConfig {
        TableConfig::new("Users", "users", KeyAttribute::string("id"))
    }

    #[test]
    fn test_decode_composite_id() {
        let key = decode("a12$1570354849343", &products()).unwrap();

        assert_eq!(key.partition_key, KeyValue::from("a12"));
        assert_eq!(key.sort_key, Some(KeyValue::Number(1570354849343.0)));
    }

    #[test]
    fn test_decode_splits_at_first_separator() {
        let table = TableConfig::new("Events", "events", KeyAttribute::string("pk"))
            .with_sort_key(KeyAttribute::string("sk"));

        let key = decode("p$s$t", &table).unwrap();

        assert_eq!(key.partition_key, KeyValue::from("p"));
        assert_eq!(key.sort_key, Some(KeyValue::from("s$t")));
    }

    #[test]
    fn test_decode_missing_separator() {
        let err = decode("a12", &products()).unwrap_err();
        assert_eq!(
            err,
            AccessError::MalformedCompositeKey {
                id: "a12".to_string(),
                separator: "$".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_partition_only_string_table() {
        let key = decode("a$b", &users()).unwrap();
        assert_eq!(key, TypedKey::partition("a$b"));
    }

    #[test]
    fn test_decode_partition_only_number_table() {
        let table = TableConfig::new("Counters", "counters", KeyAttribute::number("n"));
        assert_eq!(
            decode("17", &table).unwrap().partition_key,
            KeyValue::Number(17.0)
        );
    }

    #[test]
    fn test_decode_invalid_number_is_nan() {
        let key = decode("a12$yesterday", &products()).unwrap();
        assert!(key.sort_key.and_then(|k| k.as_f64()).unwrap().is_nan());
    }

    #[test]
    fn test_decode_with_custom_separator() {
        let table = products().with_separator("#");
        let key = decode("a12#5", &table).unwrap();
        assert_eq!(key.sort_key, Some(KeyValue::Number(5.0)));
        assert!(decode("a12$5", &table).is_err());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let table = TableConfig::new("Events", "events", KeyAttribute::string("pk"))
            .with_sort_key(KeyAttribute::string("sk"));

        for id in ["a$b", "a$", "$b", "user-1$2019-09-01$x"] {
            let key = decode(id, &table).unwrap();
            assert_eq!(encode(&key, &table), id);
        }
    }

    #[test]
    fn test_encode_number_sort_key() {
        let key = TypedKey::composite("a12", 1570354849343.0);
        assert_eq!(encode(&key, &products()), "a12$1570354849343");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(" -1.5 "), -1.5);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("Infinity"), f64::INFINITY);
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("12abc").is_nan());
        assert!(parse_number("+-5").is_nan());
    }

    #[test]
    fn test_parse_number_radix_literals() {
        assert_eq!(parse_number("0x10"), 16.0);
        assert_eq!(parse_number("0XfF"), 255.0);
        assert_eq!(parse_number("0o7"), 7.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert!(parse_number("0x").is_nan());
        assert!(parse_number("0b12").is_nan());
        assert!(parse_number("-0x10").is_nan());
    }

    #[test]
    fn test_to_key() {
        let key = to_key("a12$7", &products()).unwrap();
        assert_eq!(key.get("id"), Some(&KeyValue::from("a12")));
        assert_eq!(key.get("timestamp"), Some(&KeyValue::Number(7.0)));
    }

    #[test]
    fn test_combine_keys() {
        let mut key = Key::new();
        key.insert("id".to_string(), KeyValue::from("a12"));
        key.insert("timestamp".to_string(), KeyValue::Number(1570354849343.0));

        assert_eq!(combine_keys(&key, &products()), "a12$1570354849343");
    }

    #[test]
    fn test_combine_keys_without_sort_attribute() {
        let mut key = Key::new();
        key.insert("id".to_string(), KeyValue::from("a12"));

        assert_eq!(combine_keys(&key, &products()), "a12");
    }

    #[test]
    fn test_id_of_item() {
        let item = json!({ "id": "a12", "timestamp": 3, "name": "lamp" });
        let item = item.as_object().unwrap();

        assert_eq!(id_of_item(item, &products()), Some("a12$3".to_string()));
        assert_eq!(id_of_item(item, &users()), Some("a12".to_string()));
    }

    #[test]
    fn test_id_of_item_missing_key_attribute() {
        let item = json!({ "id": "a12" });
        assert_eq!(id_of_item(item.as_object().unwrap(), &products()), None);
    }
}
