//! Per-table operation sets.
//!
//! [`Access`] binds a registered table to an extender and a related deleter. Its operations are
//! split by capability:
//!
//! - `crud`: point and batch reads, creates, deletes and scans
//! - `batch`: batch writes with retry on unprocessed requests
//! - `mutable`: partial updates
//! - `composite`: partition + sort key queries with cursors

mod batch;
mod composite;
mod crud;
mod hooks;
mod mutable;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use tokio_stream::Stream;

use dynaccess_core::batch::RetryPolicy;
use dynaccess_core::store::{Item, Store};
use dynaccess_core::table::TableConfig;
use dynaccess_core::Result;

use crate::database::Database;

pub use composite::QueryPage;
pub use hooks::{
    extend_fn, related_fn, Deserialized, Extender, FnExtender, FnRelatedDeleter, Identity,
    NoRelated, RelatedDeleter,
};

/// Lazily fetched pages of raw items. Each pull issues one store request.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<Vec<Item>>> + Send>>;

/// Options for point reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub consistent_read: bool,
}

impl ReadOptions {
    pub fn consistent() -> Self {
        Self {
            consistent_read: true,
        }
    }
}

/// Operation set bound to one table.
pub struct Access<E = Item> {
    table: Arc<TableConfig>,
    store: Arc<dyn Store>,
    retry: RetryPolicy,
    extender: Arc<dyn Extender<E>>,
    related: Arc<dyn RelatedDeleter>,
}

impl<E> Clone for Access<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            store: Arc::clone(&self.store),
            retry: self.retry,
            extender: Arc::clone(&self.extender),
            related: Arc::clone(&self.related),
        }
    }
}

impl<E> fmt::Debug for Access<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Access")
            .field("table", &self.table.alias)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Access<Item> {
    /// Starts building a handle for the table registered as `alias`.
    pub fn builder(database: &Database, alias: impl Into<String>) -> AccessBuilder<Item> {
        AccessBuilder {
            database: database.clone(),
            alias: alias.into(),
            extender: Arc::new(Identity),
            related: Arc::new(NoRelated),
        }
    }
}

impl<E> Access<E> {
    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    pub fn partition_key_name(&self) -> &str {
        self.table.partition_key_name()
    }

    pub fn sort_key_name(&self) -> Option<&str> {
        self.table.sort_key_name()
    }

    pub fn separator(&self) -> &str {
        &self.table.separator
    }
}

/// Builder for [`Access`].
pub struct AccessBuilder<E> {
    database: Database,
    alias: String,
    extender: Arc<dyn Extender<E>>,
    related: Arc<dyn RelatedDeleter>,
}

impl<E> AccessBuilder<E> {
    /// Replaces the extender, changing the entity type.
    pub fn extend<T>(self, extender: impl Extender<T> + 'static) -> AccessBuilder<T> {
        AccessBuilder {
            database: self.database,
            alias: self.alias,
            extender: Arc::new(extender),
            related: self.related,
        }
    }

    pub fn delete_related(mut self, related: impl RelatedDeleter + 'static) -> Self {
        self.related = Arc::new(related);
        self
    }

    /// Resolves the table. Fails with `UnknownTable` if the alias is not registered.
    pub fn build(self) -> Result<Access<E>> {
        let table = self.database.registry().resolve(&self.alias)?;
        Ok(Access {
            table,
            store: self.database.store(),
            retry: self.database.retry_policy(),
            extender: self.extender,
            related: self.related,
        })
    }
}
