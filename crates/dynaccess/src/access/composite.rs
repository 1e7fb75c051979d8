use std::sync::Arc;

use tokio_stream::StreamExt;

use dynaccess_core::expression::KeyCondition;
use dynaccess_core::key::{self, Key};
use dynaccess_core::store::{Item, QueryInput};
use dynaccess_core::{AccessError, Result};

use super::{Access, PageStream};

/// One page of query results.
///
/// `next_cursor` is the continuation key re-encoded as an identifier; pass it back to fetch the
/// following page. `None` on the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<E: Send + 'static> Access<E> {
    /// Fetches one page of items in `partition`, starting after `cursor`.
    pub async fn query(&self, partition: &str, cursor: Option<&str>) -> Result<QueryPage<E>> {
        self.query_begins_with(partition, None, cursor).await
    }

    pub async fn query_raw(&self, partition: &str, cursor: Option<&str>) -> Result<QueryPage<Item>> {
        self.query_begins_with_raw(partition, None, cursor).await
    }

    /// Fetches one page of items in `partition` whose sort key starts with `sort_prefix`.
    pub async fn query_begins_with(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<QueryPage<E>> {
        let page = self
            .query_begins_with_raw(partition, sort_prefix, cursor)
            .await?;
        Ok(QueryPage {
            items: self.extender.extend(page.items).await?,
            next_cursor: page.next_cursor,
        })
    }

    pub async fn query_begins_with_raw(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<QueryPage<Item>> {
        let input = self.query_input(partition, sort_prefix, cursor)?;

        let page = self.store.query(input).await?;

        Ok(QueryPage {
            items: page.items,
            next_cursor: page
                .last_evaluated_key
                .map(|key| self.combine_keys(&key)),
        })
    }

    /// Fetches every item in `partition`, starting after `cursor`.
    pub async fn query_recurse(&self, partition: &str, cursor: Option<&str>) -> Result<Vec<E>> {
        let raw = self.query_recurse_raw(partition, cursor).await?;
        self.extender.extend(raw).await
    }

    pub async fn query_recurse_raw(
        &self,
        partition: &str,
        cursor: Option<&str>,
    ) -> Result<Vec<Item>> {
        self.query_begins_with_recurse_raw(partition, None, cursor)
            .await
    }

    /// Fetches every item in `partition` whose sort key starts with `sort_prefix`.
    pub async fn query_begins_with_recurse(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Vec<E>> {
        let raw = self
            .query_begins_with_recurse_raw(partition, sort_prefix, cursor)
            .await?;
        self.extender.extend(raw).await
    }

    pub async fn query_begins_with_recurse_raw(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Vec<Item>> {
        let mut pages = self.query_pages(partition, sort_prefix, cursor)?;
        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            items.extend(page?);
        }
        Ok(items)
    }

    /// Lazily queries one page per pull.
    ///
    /// Argument errors (`MissingSortKey`, a malformed cursor) are reported before any request
    /// is made.
    pub fn query_pages(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<PageStream> {
        let first = self.query_input(partition, sort_prefix, cursor)?;
        let store = Arc::clone(&self.store);

        Ok(Box::pin(async_stream::stream! {
            let mut input = first;
            loop {
                match store.query(input.clone()).await {
                    Ok(page) => {
                        tracing::trace!(
                            table = %input.table_name,
                            items = page.items.len(),
                            more = page.last_evaluated_key.is_some(),
                            "Queried page"
                        );
                        input.exclusive_start_key = page.last_evaluated_key;
                        yield Ok(page.items);
                        if input.exclusive_start_key.is_none() {
                            break;
                        }
                    }
                    Err(err) => {
                        yield Err(AccessError::from(err));
                        break;
                    }
                }
            }
        }))
    }

    /// Encodes a store-native key (such as a continuation key) as a cursor string.
    pub fn combine_keys(&self, key: &Key) -> String {
        key::combine_keys(key, &self.table)
    }

    fn query_input(
        &self,
        partition: &str,
        sort_prefix: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<QueryInput> {
        let condition = KeyCondition::for_table(&self.table, partition, sort_prefix)?;
        let exclusive_start_key = cursor
            .map(|cursor| key::to_key(cursor, &self.table))
            .transpose()?;

        Ok(QueryInput {
            table_name: self.table.name.clone(),
            condition,
            exclusive_start_key,
        })
    }
}
