mod config;
mod registry;
mod types;

pub use config::AccessConfig;
pub use registry::TableRegistry;
pub use types::{KeyAttribute, KeyType, TableConfig, DEFAULT_SEPARATOR};
