//! Seed command implementation.

use dynaccess::{Database, Item};
use serde_json::Value;

use super::error::{DynamodbError, Result};

/// Parses a seed document: a JSON array of item objects.
pub fn parse_seed_items(contents: &str) -> Result<Vec<Item>> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| DynamodbError::InvalidSeed(e.to_string()))?;

    let Value::Array(values) = value else {
        return Err(DynamodbError::InvalidSeed(
            "expected a JSON array of items".to_string(),
        ));
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(item) => Ok(item),
            _ => Err(DynamodbError::InvalidSeed(format!(
                "item {} is not an object",
                index
            ))),
        })
        .collect()
}

/// Writes the items to the table registered as `alias`, in batches with retries.
pub async fn seed_items(database: &Database, alias: &str, items: Vec<Item>) -> Result<usize> {
    let access = database.access(alias)?;
    let written = access.create_batch_raw(items).await?;
    Ok(written.len())
}
