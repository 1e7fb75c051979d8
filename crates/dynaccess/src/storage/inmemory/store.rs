//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use dynaccess_core::batch::{BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
use dynaccess_core::expression::{Filter, KeyCondition};
use dynaccess_core::key::{Key, KeyValue};
use dynaccess_core::store::{
    GetItemInput, Item, Page, QueryInput, ScanInput, Store, UpdateItemInput, WriteRequest,
};
use dynaccess_core::table::{KeyAttribute, KeyType, TableConfig};
use dynaccess_core::{StoreError, StoreResult};

const DEFAULT_PAGE_SIZE: usize = 100;

/// A request received by the [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetItem { table: String, consistent_read: bool },
    PutItem { table: String },
    DeleteItem { table: String },
    UpdateItem { table: String },
    Query { table: String },
    Scan { table: String },
    BatchGetItem { table: String, keys: usize },
    BatchWriteItem { table: String, requests: usize },
}

#[derive(Debug, Clone)]
struct KeySchema {
    partition: KeyAttribute,
    sort: Option<KeyAttribute>,
}

/// Primary key ordered the way DynamoDB orders a partition: by sort key.
#[derive(Debug, Clone, PartialEq)]
struct StoredKey {
    partition: KeyValue,
    sort: Option<KeyValue>,
}

impl Eq for StoredKey {}

impl Ord for StoredKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partition
            .total_cmp(&other.partition)
            .then_with(|| match (&self.sort, &other.sort) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            })
    }
}

impl PartialOrd for StoredKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type TableData = BTreeMap<StoredKey, Item>;

/// In-memory store for testing.
///
/// Tables are declared up front from their [`TableConfig`]s and addressed by physical name.
/// Honours the batch limits (100 keys per read, 25 requests per write), paginates queries and
/// scans, reports a delete of a missing item as `StoreError::NotFound`, and records every
/// request it receives.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    schemas: Arc<HashMap<String, KeySchema>>,
    tables: Arc<RwLock<HashMap<String, TableData>>>,
    page_size: usize,
    failing_write_rounds: Arc<AtomicU32>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl InMemoryStore {
    /// Creates an empty store holding the given tables.
    pub fn new(tables: &[TableConfig]) -> Self {
        let schemas = tables
            .iter()
            .map(|table| {
                (
                    table.name.clone(),
                    KeySchema {
                        partition: table.partition_key.clone(),
                        sort: table.sort_key.clone(),
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        let data = schemas
            .keys()
            .map(|name| (name.clone(), TableData::new()))
            .collect();

        Self {
            schemas: Arc::new(schemas),
            tables: Arc::new(RwLock::new(data)),
            page_size: DEFAULT_PAGE_SIZE,
            failing_write_rounds: Arc::new(AtomicU32::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Maximum number of items evaluated per query or scan page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Makes the next `rounds` batch writes leave part of their requests unprocessed.
    ///
    /// A failing round processes the first half of the requests (rounded down) and hands the
    /// rest back.
    pub fn fail_batch_writes(&self, rounds: u32) {
        self.failing_write_rounds
            .store(rounds, AtomicOrdering::SeqCst);
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Snapshot of a table's items in key order.
    pub async fn items(&self, table_name: &str) -> Vec<Item> {
        self.tables
            .read()
            .await
            .get(table_name)
            .map(|data| data.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn item_count(&self, table_name: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table_name)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    fn schema(&self, table_name: &str) -> StoreResult<&KeySchema> {
        self.schemas
            .get(table_name)
            .ok_or_else(|| StoreError::QueryFailed(format!("Table not found: {table_name}")))
    }

    /// Takes one failing round if any are left.
    fn take_failing_round(&self) -> bool {
        self.failing_write_rounds
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
    }
}

// ============================================================================
// Key and condition helpers
// ============================================================================

fn key_type_matches(value: &KeyValue, key_type: KeyType) -> bool {
    match (value, key_type) {
        (KeyValue::String(_), KeyType::String) => true,
        (KeyValue::Number(n), KeyType::Number) => n.is_finite(),
        _ => false,
    }
}

fn key_attribute(
    attribute: &KeyAttribute,
    lookup: impl Fn(&str) -> Option<KeyValue>,
) -> StoreResult<KeyValue> {
    let value = lookup(&attribute.name).ok_or_else(|| {
        StoreError::InvalidData(format!("Missing key attribute {}", attribute.name))
    })?;
    if !key_type_matches(&value, attribute.key_type) {
        return Err(StoreError::InvalidData(format!(
            "Key attribute {} does not match the schema type",
            attribute.name
        )));
    }
    Ok(value)
}

fn stored_key(
    schema: &KeySchema,
    lookup: impl Fn(&str) -> Option<KeyValue>,
) -> StoreResult<StoredKey> {
    let partition = key_attribute(&schema.partition, &lookup)?;
    let sort = schema
        .sort
        .as_ref()
        .map(|sort| key_attribute(sort, &lookup))
        .transpose()?;
    Ok(StoredKey { partition, sort })
}

fn key_from_map(schema: &KeySchema, key: &Key) -> StoreResult<StoredKey> {
    let expected = 1 + usize::from(schema.sort.is_some());
    if key.len() != expected {
        return Err(StoreError::InvalidData(
            "The provided key element does not match the schema".to_string(),
        ));
    }
    stored_key(schema, |name| key.get(name).cloned())
}

fn key_from_item(schema: &KeySchema, item: &Item) -> StoreResult<StoredKey> {
    stored_key(schema, |name| item.get(name).and_then(KeyValue::from_value))
}

fn to_key(schema: &KeySchema, key: &StoredKey) -> Key {
    let mut native = Key::new();
    native.insert(schema.partition.name.clone(), key.partition.clone());
    if let (Some(sort), Some(value)) = (&schema.sort, &key.sort) {
        native.insert(sort.name.clone(), value.clone());
    }
    native
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn matches_filter(item: &Item, filter: &Filter) -> bool {
    let equals = filter
        .equals
        .defined()
        .all(|(name, expected)| item.get(name).is_some_and(|v| values_equal(v, expected)));
    let contains = match filter.active_contains() {
        Some(clause) => match item.get(&clause.array_name) {
            Some(Value::Array(values)) => values.iter().any(|v| values_equal(v, &clause.value)),
            Some(Value::String(s)) => clause.value.as_str().is_some_and(|needle| s.contains(needle)),
            _ => false,
        },
        None => true,
    };
    equals && contains
}

fn sort_key_begins_with(key: &StoredKey, prefix: Option<&str>) -> bool {
    match (prefix, &key.sort) {
        (None, _) => true,
        (Some(prefix), Some(KeyValue::String(sort))) => sort.starts_with(prefix),
        (Some(_), _) => false,
    }
}

/// Evaluates up to `page_size` entries from `entries`, keeping the ones accepted by `keep`.
fn paginate<'a>(
    schema: &KeySchema,
    entries: impl Iterator<Item = (&'a StoredKey, &'a Item)>,
    page_size: usize,
    mut keep: impl FnMut(&StoredKey, &Item) -> StoreResult<bool>,
) -> StoreResult<Page> {
    let mut items = Vec::new();
    let mut evaluated = 0;
    let mut last_key = None;
    let mut entries = entries.peekable();

    while let Some((key, item)) = entries.next() {
        if keep(key, item)? {
            items.push(item.clone());
        }
        evaluated += 1;
        if evaluated == page_size {
            if entries.peek().is_some() {
                last_key = Some(to_key(schema, key));
            }
            break;
        }
    }

    Ok(Page {
        items,
        last_evaluated_key: last_key,
    })
}

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait]
impl Store for InMemoryStore {
    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<Item>> {
        self.record(StoreCall::GetItem {
            table: input.table_name.clone(),
            consistent_read: input.consistent_read,
        });
        let schema = self.schema(&input.table_name)?;
        let key = key_from_map(schema, &input.key)?;

        let tables = self.tables.read().await;
        Ok(tables
            .get(&input.table_name)
            .and_then(|data| data.get(&key))
            .cloned())
    }

    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()> {
        self.record(StoreCall::PutItem {
            table: table_name.to_string(),
        });
        let schema = self.schema(table_name)?;
        let key = key_from_item(schema, &item)?;

        let mut tables = self.tables.write().await;
        tables
            .entry(table_name.to_string())
            .or_default()
            .insert(key, item);
        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: Key) -> StoreResult<()> {
        self.record(StoreCall::DeleteItem {
            table: table_name.to_string(),
        });
        let schema = self.schema(table_name)?;
        let key = key_from_map(schema, &key)?;

        let mut tables = self.tables.write().await;
        tables
            .get_mut(table_name)
            .and_then(|data| data.remove(&key))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                table: table_name.to_string(),
            })
    }

    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<Item> {
        self.record(StoreCall::UpdateItem {
            table: input.table_name.clone(),
        });
        let schema = self.schema(&input.table_name)?;
        let key = key_from_map(schema, &input.key)?;

        let key_names: Vec<&str> = input.key.keys().map(String::as_str).collect();
        let touches_key = input
            .update
            .set
            .defined()
            .map(|(name, _)| name)
            .chain(input.update.removed())
            .any(|name| key_names.contains(&name));
        if touches_key {
            return Err(StoreError::InvalidData(
                "Cannot update attribute that is part of the key".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let data = tables.entry(input.table_name.clone()).or_default();
        let item = data.entry(key).or_insert_with(|| {
            input
                .key
                .iter()
                .map(|(name, value)| (name.clone(), value.to_value()))
                .collect()
        });

        let mut updated = Item::new();
        for (name, value) in input.update.set.defined() {
            item.insert(name.to_string(), value.clone());
            updated.insert(name.to_string(), value.clone());
        }
        for name in input.update.removed() {
            item.remove(name);
        }
        Ok(updated)
    }

    async fn query(&self, input: QueryInput) -> StoreResult<Page> {
        self.record(StoreCall::Query {
            table: input.table_name.clone(),
        });
        let schema = self.schema(&input.table_name)?;
        let KeyCondition {
            partition_value,
            sort_prefix,
            ..
        } = &input.condition;

        let start = match &input.exclusive_start_key {
            Some(key) => Bound::Excluded(key_from_map(schema, key)?),
            None => Bound::Unbounded,
        };

        let string_sort_key = schema
            .sort
            .as_ref()
            .is_some_and(|sort| sort.key_type == KeyType::String);
        if sort_prefix.is_some() && !string_sort_key {
            return Err(StoreError::InvalidData(
                "begins_with requires a string sort key".to_string(),
            ));
        }

        let tables = self.tables.read().await;
        let Some(data) = tables.get(&input.table_name) else {
            return Ok(Page::default());
        };
        // The key condition narrows the partition before the page limit applies.
        let entries = data
            .range((start, Bound::Unbounded))
            .skip_while(|(key, _)| key.partition.total_cmp(partition_value) == Ordering::Less)
            .take_while(|(key, _)| key.partition == *partition_value)
            .filter(|(key, _)| sort_key_begins_with(key, sort_prefix.as_deref()));

        paginate(schema, entries, self.page_size, |_, _| Ok(true))
    }

    async fn scan(&self, input: ScanInput) -> StoreResult<Page> {
        self.record(StoreCall::Scan {
            table: input.table_name.clone(),
        });
        let schema = self.schema(&input.table_name)?;
        let start = match &input.exclusive_start_key {
            Some(key) => Bound::Excluded(key_from_map(schema, key)?),
            None => Bound::Unbounded,
        };

        let tables = self.tables.read().await;
        let Some(data) = tables.get(&input.table_name) else {
            return Ok(Page::default());
        };

        paginate(
            schema,
            data.range((start, Bound::Unbounded)),
            self.page_size,
            |_, item| {
                Ok(input
                    .filter
                    .as_ref()
                    .is_none_or(|filter| matches_filter(item, filter)))
            },
        )
    }

    async fn batch_get_item(&self, table_name: &str, keys: Vec<Key>) -> StoreResult<Vec<Item>> {
        self.record(StoreCall::BatchGetItem {
            table: table_name.to_string(),
            keys: keys.len(),
        });
        if keys.is_empty() || keys.len() > BATCH_GET_LIMIT {
            return Err(StoreError::InvalidData(format!(
                "BatchGetItem accepts 1 to {BATCH_GET_LIMIT} keys, got {}",
                keys.len()
            )));
        }
        let schema = self.schema(table_name)?;
        let keys = keys
            .iter()
            .map(|key| key_from_map(schema, key))
            .collect::<StoreResult<Vec<_>>>()?;

        let tables = self.tables.read().await;
        let Some(data) = tables.get(table_name) else {
            return Ok(Vec::new());
        };
        Ok(keys.iter().filter_map(|key| data.get(key).cloned()).collect())
    }

    async fn batch_write_item(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<Vec<WriteRequest>> {
        self.record(StoreCall::BatchWriteItem {
            table: table_name.to_string(),
            requests: requests.len(),
        });
        if requests.is_empty() || requests.len() > BATCH_WRITE_LIMIT {
            return Err(StoreError::InvalidData(format!(
                "BatchWriteItem accepts 1 to {BATCH_WRITE_LIMIT} requests, got {}",
                requests.len()
            )));
        }
        let schema = self.schema(table_name)?;

        let mut requests = requests;
        let unprocessed = if self.take_failing_round() {
            requests.split_off(requests.len() / 2)
        } else {
            Vec::new()
        };

        // Validate the whole batch before applying any of it.
        let writes = requests
            .into_iter()
            .map(|request| match request {
                WriteRequest::Put(item) => Ok((key_from_item(schema, &item)?, Some(item))),
                WriteRequest::Delete(key) => Ok((key_from_map(schema, &key)?, None)),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut tables = self.tables.write().await;
        let data = tables.entry(table_name.to_string()).or_default();
        for (key, item) in writes {
            match item {
                Some(item) => {
                    data.insert(key, item);
                }
                None => {
                    data.remove(&key);
                }
            }
        }

        Ok(unprocessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynaccess_core::expression::{ArrayContains, AttributeMap, UpdateExpression};
    use serde_json::json;

    fn products() -> TableConfig {
        TableConfig::new("Products", "products", KeyAttribute::string("id"))
            .with_sort_key(KeyAttribute::string("date"))
    }

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn key(id: &str, date: &str) -> Key {
        let mut key = Key::new();
        key.insert("id".to_string(), KeyValue::from(id));
        key.insert("date".to_string(), KeyValue::from(date));
        key
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new(&[products()]);
        for (id, date) in [
            ("a12", "2019-09-01"),
            ("a12", "2019-09-15"),
            ("a12", "2019-10-01"),
            ("b7", "2019-09-02"),
        ] {
            store
                .put_item("products", item(json!({ "id": id, "date": date, "tags": ["x"] })))
                .await
                .unwrap();
        }
        store.clear_calls();
        store
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = seeded().await;

        let found = store
            .get_item(GetItemInput {
                table_name: "products".to_string(),
                key: key("a12", "2019-09-15"),
                consistent_read: true,
            })
            .await
            .unwrap();

        assert_eq!(found.unwrap()["date"], json!("2019-09-15"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::GetItem {
                table: "products".to_string(),
                consistent_read: true
            }]
        );
    }

    #[tokio::test]
    async fn test_put_rejects_missing_key_attribute() {
        let store = InMemoryStore::new(&[products()]);

        let err = store
            .put_item("products", item(json!({ "id": "a12" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = seeded().await;

        store
            .delete_item("products", key("a12", "2019-09-01"))
            .await
            .unwrap();
        let err = store
            .delete_item("products", key("a12", "2019-09-01"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_begins_with() {
        let store = seeded().await;
        let condition = KeyCondition::for_table(&products(), "a12", Some("2019-09-")).unwrap();

        let page = store
            .query(QueryInput {
                table_name: "products".to_string(),
                condition,
                exclusive_start_key: None,
            })
            .await
            .unwrap();

        let dates: Vec<_> = page.items.iter().map(|i| i["date"].clone()).collect();
        assert_eq!(dates, vec![json!("2019-09-01"), json!("2019-09-15")]);
        assert_eq!(page.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_query_prefix_applies_before_page_limit() {
        let store = seeded().await.with_page_size(1);
        let condition = KeyCondition::for_table(&products(), "a12", Some("2019-09-15")).unwrap();

        let page = store
            .query(QueryInput {
                table_name: "products".to_string(),
                condition,
                exclusive_start_key: None,
            })
            .await
            .unwrap();

        assert_eq!(page.items, vec![item(json!({ "id": "a12", "date": "2019-09-15", "tags": ["x"] }))]);
        assert_eq!(page.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_query_paginates() {
        let store = seeded().await.with_page_size(2);
        let condition = KeyCondition::for_table(&products(), "a12", None).unwrap();

        let first = store
            .query(QueryInput {
                table_name: "products".to_string(),
                condition: condition.clone(),
                exclusive_start_key: None,
            })
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.last_evaluated_key, Some(key("a12", "2019-09-15")));

        let second = store
            .query(QueryInput {
                table_name: "products".to_string(),
                condition,
                exclusive_start_key: first.last_evaluated_key,
            })
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_scan_filters_and_paginates() {
        let store = seeded().await.with_page_size(3);
        store
            .put_item(
                "products",
                item(json!({ "id": "c1", "date": "2020-01-01", "tags": ["sale"] })),
            )
            .await
            .unwrap();
        let filter = Filter::new(None, Some(ArrayContains::new("tags", "x")));

        let first = store
            .scan(ScanInput {
                table_name: "products".to_string(),
                filter: Some(filter.clone()),
                exclusive_start_key: None,
            })
            .await
            .unwrap();
        let second = store
            .scan(ScanInput {
                table_name: "products".to_string(),
                filter: Some(filter),
                exclusive_start_key: first.last_evaluated_key.clone(),
            })
            .await
            .unwrap();

        assert_eq!(first.items.len(), 3);
        assert!(first.last_evaluated_key.is_some());
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_scan_equality_filter_compares_numbers() {
        let store = InMemoryStore::new(&[products()]);
        store
            .put_item("products", item(json!({ "id": "a", "date": "d", "stock": 3 })))
            .await
            .unwrap();
        let filter = Filter::new(Some(AttributeMap::new().with("stock", 3.0)), None);

        let page = store
            .scan(ScanInput {
                table_name: "products".to_string(),
                filter: Some(filter),
                exclusive_start_key: None,
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_upserts_and_returns_updated_attributes() {
        let store = seeded().await;
        let update = UpdateExpression::new(
            AttributeMap::new().with("name", "lamp"),
            vec!["tags".to_string()],
        );

        let updated = store
            .update_item(UpdateItemInput {
                table_name: "products".to_string(),
                key: key("a12", "2019-09-01"),
                update,
            })
            .await
            .unwrap();

        assert_eq!(updated, item(json!({ "name": "lamp" })));
        let stored = store.items("products").await;
        assert_eq!(
            stored[0],
            item(json!({ "id": "a12", "date": "2019-09-01", "name": "lamp" }))
        );
    }

    #[tokio::test]
    async fn test_update_rejects_key_attributes() {
        let store = seeded().await;
        let update = UpdateExpression::new(AttributeMap::new().with("date", "x"), vec![]);

        let err = store
            .update_item(UpdateItemInput {
                table_name: "products".to_string(),
                key: key("a12", "2019-09-01"),
                update,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_batch_limits() {
        let store = InMemoryStore::new(&[products()]);
        let keys: Vec<_> = (0..101).map(|i| key(&i.to_string(), "d")).collect();

        assert!(store.batch_get_item("products", keys).await.is_err());

        let writes: Vec<_> = (0..26)
            .map(|i| WriteRequest::Delete(key(&i.to_string(), "d")))
            .collect();
        assert!(store.batch_write_item("products", writes).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_round_returns_unprocessed_half() {
        let store = InMemoryStore::new(&[products()]);
        store.fail_batch_writes(1);
        let writes: Vec<_> = (0..4)
            .map(|i| WriteRequest::Put(item(json!({ "id": i.to_string(), "date": "d" }))))
            .collect();

        let unprocessed = store
            .batch_write_item("products", writes.clone())
            .await
            .unwrap();
        assert_eq!(unprocessed, writes[2..].to_vec());
        assert_eq!(store.item_count("products").await, 2);

        let unprocessed = store.batch_write_item("products", unprocessed).await.unwrap();
        assert!(unprocessed.is_empty());
        assert_eq!(store.item_count("products").await, 4);
    }
}
