//! Conversions between access-layer values and DynamoDB attribute maps.
//!
//! Pure functions; testable without DynamoDB access.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, PutRequest};
use serde_json::Value;

use dynaccess_core::key::{parse_number, Key, KeyValue};
use dynaccess_core::store::{Item, WriteRequest};
use dynaccess_core::{StoreError, StoreResult};

use super::error::map_build_error;

pub type Attributes = HashMap<String, AttributeValue>;

// ============================================================================
// Keys
// ============================================================================

pub fn key_value_to_attribute(value: &KeyValue) -> AttributeValue {
    match value {
        KeyValue::String(s) => AttributeValue::S(s.clone()),
        KeyValue::Number(n) => AttributeValue::N(n.to_string()),
    }
}

pub fn key_to_attributes(key: &Key) -> Attributes {
    key.iter()
        .map(|(name, value)| (name.clone(), key_value_to_attribute(value)))
        .collect()
}

/// Converts a key returned by DynamoDB (such as `LastEvaluatedKey`) back into a [`Key`].
pub fn attributes_to_key(attributes: &Attributes) -> StoreResult<Key> {
    attributes
        .iter()
        .map(|(name, value)| {
            let value = match value {
                AttributeValue::S(s) => KeyValue::String(s.clone()),
                AttributeValue::N(n) => KeyValue::Number(parse_number(n)),
                other => {
                    return Err(StoreError::InvalidData(format!(
                        "Key attribute {} has unsupported type: {:?}",
                        name, other
                    )))
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

// ============================================================================
// Items and values
// ============================================================================

pub fn item_to_attributes(item: &Item) -> StoreResult<Attributes> {
    serde_dynamo::to_item(item).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn attributes_to_item(attributes: Attributes) -> StoreResult<Item> {
    serde_dynamo::from_item(attributes).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn attributes_to_items(items: Vec<Attributes>) -> StoreResult<Vec<Item>> {
    items.into_iter().map(attributes_to_item).collect()
}

pub fn value_to_attribute(value: &Value) -> StoreResult<AttributeValue> {
    serde_dynamo::to_attribute_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Placeholder values for an expression. `None` when there are none, since DynamoDB rejects an
/// empty `ExpressionAttributeValues` map.
pub fn expression_values(values: &BTreeMap<String, Value>) -> StoreResult<Option<Attributes>> {
    if values.is_empty() {
        return Ok(None);
    }
    values
        .iter()
        .map(|(placeholder, value)| Ok((placeholder.clone(), value_to_attribute(value)?)))
        .collect::<StoreResult<Attributes>>()
        .map(Some)
}

pub fn expression_names(names: &BTreeMap<String, String>) -> Option<HashMap<String, String>> {
    if names.is_empty() {
        return None;
    }
    Some(
        names
            .iter()
            .map(|(placeholder, name)| (placeholder.clone(), name.clone()))
            .collect(),
    )
}

// ============================================================================
// Batch write requests
// ============================================================================

pub fn write_request_to_sdk(
    request: &WriteRequest,
) -> StoreResult<aws_sdk_dynamodb::types::WriteRequest> {
    let builder = aws_sdk_dynamodb::types::WriteRequest::builder();
    let builder = match request {
        WriteRequest::Put(item) => builder.put_request(
            PutRequest::builder()
                .set_item(Some(item_to_attributes(item)?))
                .build()
                .map_err(map_build_error)?,
        ),
        WriteRequest::Delete(key) => builder.delete_request(
            DeleteRequest::builder()
                .set_key(Some(key_to_attributes(key)))
                .build()
                .map_err(map_build_error)?,
        ),
    };
    Ok(builder.build())
}

/// Converts an unprocessed request echoed back by DynamoDB.
pub fn write_request_from_sdk(
    request: aws_sdk_dynamodb::types::WriteRequest,
) -> StoreResult<WriteRequest> {
    if let Some(put) = request.put_request {
        return Ok(WriteRequest::Put(attributes_to_item(put.item)?));
    }
    if let Some(delete) = request.delete_request {
        return Ok(WriteRequest::Delete(attributes_to_key(&delete.key)?));
    }
    Err(StoreError::InvalidData(
        "Write request has neither a put nor a delete".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key() -> Key {
        let mut key = Key::new();
        key.insert("id".to_string(), KeyValue::from("a12"));
        key.insert("timestamp".to_string(), KeyValue::from(1570354849343_i64));
        key
    }

    #[test]
    fn test_key_to_attributes() {
        let attributes = key_to_attributes(&key());

        assert_eq!(attributes["id"], AttributeValue::S("a12".to_string()));
        assert_eq!(
            attributes["timestamp"],
            AttributeValue::N("1570354849343".to_string())
        );
    }

    #[test]
    fn test_last_evaluated_key_back_to_key() {
        let attributes = key_to_attributes(&key());

        assert_eq!(attributes_to_key(&attributes).unwrap(), key());
    }

    #[test]
    fn test_attributes_to_key_rejects_non_scalar() {
        let mut attributes = Attributes::new();
        attributes.insert("id".to_string(), AttributeValue::Bool(true));

        let err = attributes_to_key(&attributes).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_item_to_attributes() {
        let item = json!({
            "id": "a12",
            "price": 12.5,
            "tags": ["red", "blue"],
            "active": true
        })
        .as_object()
        .cloned()
        .unwrap();

        let attributes = item_to_attributes(&item).unwrap();

        assert_eq!(attributes["id"], AttributeValue::S("a12".to_string()));
        assert_eq!(attributes["price"], AttributeValue::N("12.5".to_string()));
        assert_eq!(attributes["active"], AttributeValue::Bool(true));
        assert_eq!(
            attributes["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("red".to_string()),
                AttributeValue::S("blue".to_string()),
            ])
        );
    }

    #[test]
    fn test_attributes_to_item() {
        let mut attributes = Attributes::new();
        attributes.insert("id".to_string(), AttributeValue::S("a12".to_string()));
        attributes.insert("stock".to_string(), AttributeValue::N("3".to_string()));

        let item = attributes_to_item(attributes).unwrap();

        assert_eq!(item["id"], json!("a12"));
        assert_eq!(item["stock"], json!(3));
    }

    #[test]
    fn test_expression_values_empty_is_none() {
        assert_eq!(expression_values(&BTreeMap::new()).unwrap(), None);
        assert_eq!(expression_names(&BTreeMap::new()), None);
    }

    #[test]
    fn test_expression_values() {
        let mut values = BTreeMap::new();
        values.insert(":name".to_string(), json!("lamp"));

        let converted = expression_values(&values).unwrap().unwrap();

        assert_eq!(converted[":name"], AttributeValue::S("lamp".to_string()));
    }

    #[test]
    fn test_delete_request_round_trips_through_sdk() {
        let request = WriteRequest::Delete(key());

        let sdk = write_request_to_sdk(&request).unwrap();

        assert!(sdk.put_request.is_none());
        assert_eq!(write_request_from_sdk(sdk).unwrap(), request);
    }
}
