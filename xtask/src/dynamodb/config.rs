//! Table schemas derived from the access configuration (Functional Core - pure data).

use dynaccess::{AccessConfig, AccessError, KeyType, TableConfig};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub alias: String,
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// DynamoDB scalar attribute types used by keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
}

impl AttributeType {
    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
        }
    }
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl From<&dynaccess::KeyAttribute> for KeyAttribute {
    fn from(key: &dynaccess::KeyAttribute) -> Self {
        Self {
            name: key.name.clone(),
            attribute_type: match key.key_type {
                KeyType::String => AttributeType::String,
                KeyType::Number => AttributeType::Number,
            },
        }
    }
}

impl From<&TableConfig> for TableSchema {
    fn from(table: &TableConfig) -> Self {
        Self {
            alias: table.alias.clone(),
            table_name: table.name.clone(),
            partition_key: KeyAttribute::from(&table.partition_key),
            sort_key: table.sort_key.as_ref().map(KeyAttribute::from),
            billing_mode: BillingMode::PayPerRequest,
        }
    }
}

/// Returns the schemas of every registered table, or only of `alias` when given.
/// This is a pure function - no I/O.
pub fn table_schemas(
    config: &AccessConfig,
    alias: Option<&str>,
) -> Result<Vec<TableSchema>, AccessError> {
    let registry = config.registry()?;
    match alias {
        Some(alias) => Ok(vec![TableSchema::from(registry.resolve(alias)?.as_ref())]),
        None => Ok(registry
            .tables()
            .iter()
            .map(|table| TableSchema::from(table.as_ref()))
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use dynaccess::KeyAttribute as ConfigKey;

    use super::*;

    fn config() -> AccessConfig {
        AccessConfig::new(
            3,
            vec![
                TableConfig::new("Users", "users", ConfigKey::string("id")),
                TableConfig::new("Products", "products", ConfigKey::string("id"))
                    .with_sort_key(ConfigKey::number("timestamp")),
            ],
        )
    }

    #[test]
    fn test_all_tables_sorted_by_alias() {
        let schemas = table_schemas(&config(), None).unwrap();

        let aliases: Vec<&str> = schemas.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["Products", "Users"]);
        assert_eq!(
            schemas[0].sort_key,
            Some(KeyAttribute {
                name: "timestamp".to_string(),
                attribute_type: AttributeType::Number,
            })
        );
        assert_eq!(schemas[1].sort_key, None);
    }

    #[test]
    fn test_single_table_by_alias() {
        let schemas = table_schemas(&config(), Some("Users")).unwrap();

        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].table_name, "users");
        assert_eq!(schemas[0].partition_key.attribute_type.code(), "S");
    }

    #[test]
    fn test_unknown_alias() {
        let err = table_schemas(&config(), Some("Orders")).unwrap_err();

        assert_eq!(
            err,
            AccessError::UnknownTable {
                alias: "Orders".to_string()
            }
        );
    }
}
