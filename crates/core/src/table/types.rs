use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// Separator used between partition and sort segments when none is configured.
pub const DEFAULT_SEPARATOR: &str = "$";

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    Number,
}

impl KeyType {
    /// DynamoDB attribute type letter.
    pub fn as_attribute_type(&self) -> &'static str {
        match self {
            KeyType::String => "S",
            KeyType::Number => "N",
        }
    }
}

/// A key attribute: its name and scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub key_type: KeyType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::Number)
    }
}

/// Per-table configuration, resolved by alias through the
/// [`TableRegistry`](super::TableRegistry).
///
/// Deserialises from the flat camelCase layout used in configuration files:
///
/// ```json
/// {
///   "tableAlias": "Products",
///   "tableName": "products",
///   "partitionKeyName": "id",
///   "partitionKeyType": "string",
///   "sortKeyName": "timestamp",
///   "sortKeyType": "number"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableConfigFile", into = "TableConfigFile")]
pub struct TableConfig {
    pub alias: String,
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub separator: String,
}

impl TableConfig {
    /// Creates a partition-only table using the default separator.
    pub fn new(
        alias: impl Into<String>,
        name: impl Into<String>,
        partition_key: KeyAttribute,
    ) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            partition_key,
            sort_key: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: KeyAttribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn has_sort_key(&self) -> bool {
        self.sort_key.is_some()
    }

    pub fn partition_key_name(&self) -> &str {
        &self.partition_key.name
    }

    pub fn sort_key_name(&self) -> Option<&str> {
        self.sort_key.as_ref().map(|key| key.name.as_str())
    }

    /// Checks the invariants that the type alone cannot express.
    pub fn validate(&self) -> Result<(), AccessError> {
        if self.alias.is_empty() {
            return Err(AccessError::InvalidConfig(
                "table alias must not be empty".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(AccessError::InvalidConfig(format!(
                "table {} has an empty table name",
                self.alias
            )));
        }
        if self.partition_key.name.is_empty() {
            return Err(AccessError::InvalidConfig(format!(
                "table {} has an empty partition key name",
                self.alias
            )));
        }
        if self.separator.is_empty() {
            return Err(AccessError::InvalidConfig(format!(
                "table {} has an empty sort key separator",
                self.alias
            )));
        }
        if let Some(sort_key) = &self.sort_key {
            if sort_key.name.is_empty() {
                return Err(AccessError::InvalidConfig(format!(
                    "table {} has an empty sort key name",
                    self.alias
                )));
            }
            if sort_key.name == self.partition_key.name {
                return Err(AccessError::InvalidConfig(format!(
                    "table {} uses {} as both partition and sort key",
                    self.alias, sort_key.name
                )));
            }
        }
        Ok(())
    }
}

/// On-disk shape of a [`TableConfig`].
///
/// A table without `tableAlias` is registered under its table name, which may also be given as
/// `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_alias: Option<String>,
    #[serde(alias = "name")]
    table_name: String,
    partition_key_name: String,
    partition_key_type: KeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_key_type: Option<KeyType>,
    #[serde(default = "default_separator")]
    sort_key_separator: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    indices: Vec<serde_json::Value>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl TryFrom<TableConfigFile> for TableConfig {
    type Error = AccessError;

    fn try_from(file: TableConfigFile) -> Result<Self, Self::Error> {
        let alias = file
            .table_alias
            .unwrap_or_else(|| file.table_name.clone());
        if !file.indices.is_empty() {
            return Err(AccessError::InvalidConfig(format!(
                "table {} declares secondary indices, which are not supported",
                alias
            )));
        }

        let sort_key = match (file.sort_key_name, file.sort_key_type) {
            (Some(name), Some(key_type)) => Some(KeyAttribute::new(name, key_type)),
            (None, None) => None,
            (Some(name), None) => {
                return Err(AccessError::InvalidConfig(format!(
                    "table {} declares sort key {} without a sortKeyType",
                    alias, name
                )))
            }
            (None, Some(_)) => {
                return Err(AccessError::InvalidConfig(format!(
                    "table {} declares a sortKeyType without a sortKeyName",
                    alias
                )))
            }
        };

        let config = TableConfig {
            alias,
            name: file.table_name,
            partition_key: KeyAttribute::new(file.partition_key_name, file.partition_key_type),
            sort_key,
            separator: file.sort_key_separator,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<TableConfig> for TableConfigFile {
    fn from(config: TableConfig) -> Self {
        let (sort_key_name, sort_key_type) = match config.sort_key {
            Some(key) => (Some(key.name), Some(key.key_type)),
            None => (None, None),
        };
        Self {
            table_alias: Some(config.alias),
            table_name: config.name,
            partition_key_name: config.partition_key.name,
            partition_key_type: config.partition_key.key_type,
            sort_key_name,
            sort_key_type,
            sort_key_separator: config.separator,
            indices: Vec::new(),
        }
    }
}
