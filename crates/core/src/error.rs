use thiserror::Error;

/// Errors reported by a [`Store`](crate::store::Store) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found in table {table}")]
    NotFound { table: String },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors surfaced by the access layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Unknown table alias: {alias}")]
    UnknownTable { alias: String },
    #[error("Composite key must include {separator} that separates the keys: {id}")]
    MalformedCompositeKey { id: String, separator: String },
    #[error("{table} item not found: {id}")]
    NotFound { table: String, id: String },
    #[error("Sort key name is undefined for table {table}")]
    MissingSortKey { table: String },
    #[error("Maximum batch write retries exceeded for table {table} after {attempts} attempts")]
    MaxRetriesExceeded { table: String, attempts: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Database is not initialized")]
    NotInitialized,
    #[error("Hook failed: {0}")]
    Hook(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccessError {
    /// True when the error is a store-level "not found".
    pub fn is_store_not_found(&self) -> bool {
        matches!(self, AccessError::Store(StoreError::NotFound { .. }))
    }
}

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = AccessError::NotFound {
            table: "products".to_string(),
            id: "a12$1570354849343".to_string(),
        };
        assert_eq!(error.to_string(), "products item not found: a12$1570354849343");
    }

    #[test]
    fn test_malformed_key_display() {
        let error = AccessError::MalformedCompositeKey {
            id: "a12".to_string(),
            separator: "$".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Composite key must include $ that separates the keys: a12"
        );
    }

    #[test]
    fn test_missing_sort_key_display() {
        let error = AccessError::MissingSortKey {
            table: "users".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Sort key name is undefined for table users"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: AccessError = StoreError::QueryFailed("throttled".to_string()).into();
        assert_eq!(error.to_string(), "Query failed: throttled");
        assert!(!error.is_store_not_found());
    }

    #[test]
    fn test_is_store_not_found() {
        let error: AccessError = StoreError::NotFound {
            table: "products".to_string(),
        }
        .into();
        assert!(error.is_store_not_found());
    }
}
