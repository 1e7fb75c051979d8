//! Thin data-access layer over DynamoDB.
//!
//! Tables are registered once by alias; an [`Access`] handle bound to one table exposes CRUD,
//! batch, scan and composite-key query operations. Identifiers are composite strings
//! (`partition$sort`) decoded through the table's key schema.
//!
//! ```rust,ignore
//! use dynaccess::{AccessConfig, Database, ReadOptions};
//!
//! let config = dynaccess::load_config("dynaccess.json")?;
//! let database = Database::with_dynamodb(&config, dynaccess::AwsConfig::from_env())?;
//! let products = database.access("Products")?;
//!
//! let product = products.get_by_id("a12$1570354849343", ReadOptions::default()).await?;
//! ```

mod access;
mod config;
mod database;
pub mod storage;

pub use access::{
    extend_fn, related_fn, Access, AccessBuilder, Deserialized, Extender, FnExtender,
    FnRelatedDeleter, Identity, NoRelated, PageStream, QueryPage, ReadOptions, RelatedDeleter,
};
pub use config::{config_path_from_env, load_config};
pub use database::{database, init_with_store, is_initialized, reset, Database};

#[cfg(feature = "dynamodb")]
pub use database::init;
#[cfg(feature = "dynamodb")]
pub use storage::dynamodb::AwsConfig;

pub use dynaccess_core::batch::RetryPolicy;
pub use dynaccess_core::expression::{ArrayContains, AttributeMap, Filter};
pub use dynaccess_core::key::{Key, KeyValue, TypedKey};
pub use dynaccess_core::store::{Item, Store, WriteRequest};
pub use dynaccess_core::table::{AccessConfig, KeyAttribute, KeyType, TableConfig};
pub use dynaccess_core::{AccessError, Result, StoreError};
