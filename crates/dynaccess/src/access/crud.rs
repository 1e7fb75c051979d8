use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio_stream::StreamExt;

use dynaccess_core::batch::{BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
use dynaccess_core::expression::Filter;
use dynaccess_core::key::{id_of_item, to_key};
use dynaccess_core::store::{GetItemInput, Item, ScanInput, WriteRequest};
use dynaccess_core::{AccessError, Result, StoreError};

use super::{Access, PageStream, ReadOptions};

impl<E: Send + 'static> Access<E> {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads one entity by its composite identifier.
    pub async fn get_by_id(&self, id: &str, options: ReadOptions) -> Result<E> {
        let raw = self.get_by_id_raw(id, options).await?;
        self.extend_one(raw).await
    }

    /// Reads one raw item. Fails with `NotFound` when it does not exist.
    pub async fn get_by_id_raw(&self, id: &str, options: ReadOptions) -> Result<Item> {
        let key = to_key(id, &self.table)?;

        let item = self
            .store
            .get_item(GetItemInput {
                table_name: self.table.name.clone(),
                key,
                consistent_read: options.consistent_read,
            })
            .await?;

        item.ok_or_else(|| AccessError::NotFound {
            table: self.table.name.clone(),
            id: id.to_string(),
        })
    }

    /// Reads many entities. Missing identifiers are absent from the result.
    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<E>> {
        let raw = self.get_by_ids_raw(ids).await?;
        self.extender.extend(raw).await
    }

    /// Reads many raw items in concurrent chunks of at most 100 keys.
    ///
    /// Results are concatenated in chunk order; order within a chunk is the store's.
    pub async fn get_by_ids_raw(&self, ids: &[String]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys = ids
            .iter()
            .map(|id| to_key(id, &self.table))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            table = %self.table.name,
            ids = ids.len(),
            chunks = keys.len().div_ceil(BATCH_GET_LIMIT),
            "Dispatching batch get"
        );

        let chunks = keys.chunks(BATCH_GET_LIMIT).map(|chunk| {
            let store = Arc::clone(&self.store);
            let table_name = self.table.name.clone();
            let chunk = chunk.to_vec();
            async move { store.batch_get_item(&table_name, chunk).await }
        });
        let results = try_join_all(chunks).await?;

        Ok(results.into_iter().flatten().collect())
    }

    // ========================================================================
    // Creates
    // ========================================================================

    /// Writes an item unconditionally, replacing any item with the same key.
    pub async fn create(&self, item: Item) -> Result<E> {
        let raw = self.create_raw(item).await?;
        self.extend_one(raw).await
    }

    pub async fn create_raw(&self, item: Item) -> Result<Item> {
        self.store.put_item(&self.table.name, item.clone()).await?;
        Ok(item)
    }

    /// Writes many items in sequential chunks of at most 25, each retried on unprocessed
    /// requests.
    pub async fn create_batch(&self, items: Vec<Item>) -> Result<Vec<E>> {
        let raw = self.create_batch_raw(items).await?;
        self.extender.extend(raw).await
    }

    pub async fn create_batch_raw(&self, items: Vec<Item>) -> Result<Vec<Item>> {
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk.iter().cloned().map(WriteRequest::Put).collect();
            self.batch_write_with_retry(requests).await?;
        }
        Ok(items)
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Deletes one item after its related records. Deleting a missing item succeeds.
    ///
    /// Returns the identifier.
    pub async fn delete_by_id(&self, id: &str) -> Result<String> {
        let key = to_key(id, &self.table)?;

        self.related.delete_related(vec![id.to_string()]).await?;

        match self
            .store
            .delete_item(&self.table.name, key)
            .await
            .map_err(AccessError::from)
        {
            Ok(()) => {}
            Err(err) if err.is_store_not_found() => {
                tracing::debug!(table = %self.table.name, id, "Delete of missing item ignored");
            }
            Err(err) => return Err(err),
        }

        Ok(id.to_string())
    }

    /// Deletes many items in sequential chunks of at most 25. Related records of a chunk are
    /// deleted before the chunk itself.
    ///
    /// Returns the identifiers.
    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        for chunk in ids.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|id| to_key(id, &self.table).map(WriteRequest::Delete))
                .collect::<Result<Vec<_>>>()?;

            self.related.delete_related(chunk.to_vec()).await?;
            self.batch_write_with_retry(requests).await?;
        }
        Ok(ids.to_vec())
    }

    // ========================================================================
    // Scans
    // ========================================================================

    /// Scans the whole table, keeping items accepted by `filter`.
    pub async fn scan_filtered(&self, filter: Filter) -> Result<Vec<E>> {
        let raw = self.scan_filtered_raw(filter).await?;
        self.extender.extend(raw).await
    }

    pub async fn scan_filtered_raw(&self, filter: Filter) -> Result<Vec<Item>> {
        let mut pages = self.scan_pages(filter);
        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            items.extend(page?);
        }
        Ok(items)
    }

    /// Lazily scans the table one page per pull. The stream ends after the last page or the
    /// first error.
    pub fn scan_pages(&self, filter: Filter) -> PageStream {
        let store = Arc::clone(&self.store);
        let table_name = self.table.name.clone();
        let filter = (!filter.is_empty()).then_some(filter);

        Box::pin(async_stream::stream! {
            let mut exclusive_start_key = None;
            loop {
                let input = ScanInput {
                    table_name: table_name.clone(),
                    filter: filter.clone(),
                    exclusive_start_key: exclusive_start_key.take(),
                };
                match store.scan(input).await {
                    Ok(page) => {
                        tracing::trace!(
                            table = %table_name,
                            items = page.items.len(),
                            more = page.last_evaluated_key.is_some(),
                            "Scanned page"
                        );
                        exclusive_start_key = page.last_evaluated_key;
                        yield Ok(page.items);
                        if exclusive_start_key.is_none() {
                            break;
                        }
                    }
                    Err(err) => {
                        yield Err(AccessError::from(err));
                        break;
                    }
                }
            }
        })
    }

    /// Deletes every item accepted by `filter`, page by page. Items of one page are deleted
    /// concurrently, each after its related records.
    ///
    /// Returns the number of items deleted.
    pub async fn delete_scan_filtered(&self, filter: Filter) -> Result<usize> {
        let mut pages = self.scan_pages(filter);
        let mut deleted = 0;

        while let Some(page) = pages.next().await {
            let ids = page?
                .iter()
                .map(|item| {
                    id_of_item(item, &self.table).ok_or_else(|| {
                        AccessError::from(StoreError::InvalidData(format!(
                            "scanned item of {} lacks its key attributes",
                            self.table.name
                        )))
                    })
                })
                .collect::<Result<Vec<String>>>()?;

            try_join_all(ids.iter().map(|id| async move {
                tokio::try_join!(
                    self.related.delete_related(vec![id.clone()]),
                    self.delete_by_id(id)
                )
            }))
            .await?;

            deleted += ids.len();
        }

        tracing::debug!(table = %self.table.name, deleted, "Deleted scanned items");
        Ok(deleted)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(super) async fn extend_one(&self, raw: Item) -> Result<E> {
        self.extender
            .extend(vec![raw])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::Hook("extender returned no entity".to_string()))
    }
}
