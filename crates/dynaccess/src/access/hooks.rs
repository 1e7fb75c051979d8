//! Extension points of an access handle.
//!
//! An [`Extender`] turns raw items into the caller's view model after every read or write; a
//! [`RelatedDeleter`] cleans up dependent records before deletes.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use dynaccess_core::store::Item;
use dynaccess_core::{AccessError, Result, StoreError};

/// Transforms raw items into entities.
#[async_trait]
pub trait Extender<E>: Send + Sync {
    async fn extend(&self, raw: Vec<Item>) -> Result<Vec<E>>;
}

/// Returns the raw items unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Extender<Item> for Identity {
    async fn extend(&self, raw: Vec<Item>) -> Result<Vec<Item>> {
        Ok(raw)
    }
}

/// Deserialises every item into `T`.
pub struct Deserialized<T>(PhantomData<fn() -> T>);

impl<T> Deserialized<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Deserialized<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Extender<T> for Deserialized<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn extend(&self, raw: Vec<Item>) -> Result<Vec<T>> {
        raw.into_iter()
            .map(|item| {
                serde_json::from_value(item.into())
                    .map_err(|e| AccessError::from(StoreError::Serialization(e.to_string())))
            })
            .collect()
    }
}

/// Extender backed by an async closure.
pub struct FnExtender<F>(F);

/// Wraps an async closure as an [`Extender`].
pub fn extend_fn<F>(f: F) -> FnExtender<F> {
    FnExtender(f)
}

#[async_trait]
impl<E, F, Fut> Extender<E> for FnExtender<F>
where
    E: Send + 'static,
    F: Fn(Vec<Item>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<E>>> + Send,
{
    async fn extend(&self, raw: Vec<Item>) -> Result<Vec<E>> {
        (self.0)(raw).await
    }
}

/// Deletes records that depend on the given identifiers.
///
/// May run more than once for the same identifier (scan-driven deletes call it both directly
/// and through the per-id delete), so implementations must be idempotent.
#[async_trait]
pub trait RelatedDeleter: Send + Sync {
    async fn delete_related(&self, ids: Vec<String>) -> Result<()>;
}

/// Nothing depends on this table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelated;

#[async_trait]
impl RelatedDeleter for NoRelated {
    async fn delete_related(&self, _ids: Vec<String>) -> Result<()> {
        Ok(())
    }
}

/// Related deleter backed by an async closure.
pub struct FnRelatedDeleter<F>(F);

/// Wraps an async closure as a [`RelatedDeleter`].
pub fn related_fn<F>(f: F) -> FnRelatedDeleter<F> {
    FnRelatedDeleter(f)
}

#[async_trait]
impl<F, Fut> RelatedDeleter for FnRelatedDeleter<F>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn delete_related(&self, ids: Vec<String>) -> Result<()> {
        (self.0)(ids).await
    }
}
