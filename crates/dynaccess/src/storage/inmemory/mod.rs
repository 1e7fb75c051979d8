//! In-memory storage backend for testing.
//!
//! Stores every table in a `BTreeMap` ordered by primary key, wrapped in `Arc<RwLock<_>>`.
//! Data is not persisted and will be lost when the last handle is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynaccess::storage::inmemory::InMemoryStore;
//!
//! let store = Arc::new(InMemoryStore::new(&config.tables).with_page_size(10));
//! let database = Database::new(&config, store.clone())?;
//! ```

mod store;

pub use store::{InMemoryStore, StoreCall};
