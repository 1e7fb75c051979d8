use async_trait::async_trait;

use crate::error::StoreResult;
use crate::key::Key;

use super::{
    GetItemInput, Item, Page, QueryInput, ScanInput, UpdateItemInput, WriteRequest,
};

/// Document-style request/response contract of the backing store.
///
/// Backends report failures as [`StoreError`](crate::StoreError); a delete of a missing item
/// surfaces as `StoreError::NotFound`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Point read. `Ok(None)` when the item does not exist.
    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<Item>>;

    /// Unconditional put.
    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()>;

    async fn delete_item(&self, table_name: &str, key: Key) -> StoreResult<()>;

    /// Applies the update and returns the updated attributes.
    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<Item>;

    async fn query(&self, input: QueryInput) -> StoreResult<Page>;

    async fn scan(&self, input: ScanInput) -> StoreResult<Page>;

    /// Reads up to 100 keys from one table. Missing keys are absent from the result.
    async fn batch_get_item(&self, table_name: &str, keys: Vec<Key>) -> StoreResult<Vec<Item>>;

    /// Writes up to 25 requests to one table and returns the requests left unprocessed.
    async fn batch_write_item(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<Vec<WriteRequest>>;
}
