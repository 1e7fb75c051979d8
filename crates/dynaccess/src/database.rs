use std::fmt;
use std::sync::{Arc, RwLock};

use dynaccess_core::batch::RetryPolicy;
use dynaccess_core::store::{Item, Store};
use dynaccess_core::table::{AccessConfig, TableRegistry};
use dynaccess_core::{AccessError, Result};

use crate::access::Access;

/// Registered tables, the store they live in and the batch retry policy.
///
/// Cheap to clone; every clone shares the same registry and store handle.
#[derive(Clone)]
pub struct Database {
    registry: Arc<TableRegistry>,
    store: Arc<dyn Store>,
    retry: RetryPolicy,
}

impl Database {
    /// Creates a database over an existing store handle.
    pub fn new(config: &AccessConfig, store: Arc<dyn Store>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(config.registry()?),
            store,
            retry: config.retry_policy(),
        })
    }

    /// Creates a database backed by DynamoDB. The client is built on first use.
    #[cfg(feature = "dynamodb")]
    pub fn with_dynamodb(
        config: &AccessConfig,
        aws: crate::storage::dynamodb::AwsConfig,
    ) -> Result<Self> {
        let store = crate::storage::dynamodb::DynamoDbStore::lazy(aws);
        Self::new(config, Arc::new(store))
    }

    /// Binds an access handle with default hooks to the table registered as `alias`.
    pub fn access(&self, alias: &str) -> Result<Access<Item>> {
        Access::builder(self, alias).build()
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("registry", &self.registry)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Process-wide instance
// ============================================================================

static DATABASE: RwLock<Option<Database>> = RwLock::new(None);

/// Initialises the process-wide database against DynamoDB, using `AWS_ENDPOINT_URL` and
/// `AWS_REGION` from the environment.
#[cfg(feature = "dynamodb")]
pub fn init(config: &AccessConfig) -> Result<Database> {
    let database =
        Database::with_dynamodb(config, crate::storage::dynamodb::AwsConfig::from_env())?;
    install(database.clone());
    Ok(database)
}

/// Initialises the process-wide database over a pre-built store.
pub fn init_with_store(config: &AccessConfig, store: Arc<dyn Store>) -> Result<Database> {
    let database = Database::new(config, store)?;
    install(database.clone());
    Ok(database)
}

/// Returns the process-wide database.
pub fn database() -> Result<Database> {
    DATABASE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .ok_or(AccessError::NotInitialized)
}

pub fn is_initialized() -> bool {
    DATABASE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .is_some()
}

/// Drops the process-wide database. Handles already bound keep working.
pub fn reset() {
    let mut slot = DATABASE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.take().is_some() {
        tracing::debug!("Reset process-wide database");
    }
}

fn install(database: Database) {
    let mut slot = DATABASE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.is_some() {
        tracing::debug!("Replacing process-wide database");
    }
    tracing::debug!(tables = database.registry.len(), "Initialised database");
    *slot = Some(database);
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::storage::inmemory::InMemoryStore;
    use dynaccess_core::table::{KeyAttribute, TableConfig};

    fn config() -> AccessConfig {
        AccessConfig::new(
            3,
            vec![TableConfig::new("Users", "users", KeyAttribute::string("id"))],
        )
    }

    #[test]
    fn test_new_resolves_tables() {
        let store = Arc::new(InMemoryStore::new(&config().tables));
        let database = Database::new(&config(), store).unwrap();

        assert!(database.registry().resolve("Users").is_ok());
        assert_eq!(database.retry_policy().max_retries, 3);
    }

    #[test]
    fn test_access_unknown_alias() {
        let store = Arc::new(InMemoryStore::new(&config().tables));
        let database = Database::new(&config(), store).unwrap();

        let err = database.access("Orders").unwrap_err();
        assert_eq!(
            err,
            AccessError::UnknownTable {
                alias: "Orders".to_string()
            }
        );
    }

    // The process-wide slot is shared by every test in this binary, so its whole lifecycle is
    // exercised in a single test.
    #[test]
    fn test_global_lifecycle() {
        reset();
        assert!(matches!(database(), Err(AccessError::NotInitialized)));

        let store = Arc::new(InMemoryStore::new(&config().tables));
        init_with_store(&config(), store).unwrap();
        assert!(is_initialized());
        assert!(database().unwrap().access("Users").is_ok());

        reset();
        assert!(!is_initialized());
        assert!(matches!(database(), Err(AccessError::NotInitialized)));
    }
}
