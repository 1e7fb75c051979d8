use serde_json::{Map, Value};

use crate::expression::{Filter, KeyCondition, UpdateExpression};
use crate::key::Key;

/// A stored document.
pub type Item = Map<String, Value>;

/// One page of a query or scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Continuation key; `None` on the last page.
    pub last_evaluated_key: Option<Key>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetItemInput {
    pub table_name: String,
    pub key: Key,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemInput {
    pub table_name: String,
    pub key: Key,
    pub update: UpdateExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub table_name: String,
    pub condition: KeyCondition,
    pub exclusive_start_key: Option<Key>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanInput {
    pub table_name: String,
    pub filter: Option<Filter>,
    pub exclusive_start_key: Option<Key>,
}

/// A single entry of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Key),
}
