use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AccessError, Result};

use super::TableConfig;

/// Table configurations keyed by alias.
///
/// Populated once at initialisation and read-only afterwards; entries are shared as `Arc`s so
/// access handles can hold on to their table without borrowing the registry.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Arc<TableConfig>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list of configurations, rejecting duplicate aliases.
    pub fn from_tables(tables: impl IntoIterator<Item = TableConfig>) -> Result<Self> {
        let mut registry = Self::new();
        for table in tables {
            registry.register(table)?;
        }
        Ok(registry)
    }

    /// Adds a table. Fails on an invalid configuration or an alias that is already taken.
    pub fn register(&mut self, config: TableConfig) -> Result<()> {
        config.validate()?;
        if self.tables.contains_key(&config.alias) {
            return Err(AccessError::InvalidConfig(format!(
                "duplicate table alias: {}",
                config.alias
            )));
        }
        self.tables.insert(config.alias.clone(), Arc::new(config));
        Ok(())
    }

    /// Looks up a table by alias.
    pub fn resolve(&self, alias: &str) -> Result<Arc<TableConfig>> {
        self.tables
            .get(alias)
            .cloned()
            .ok_or_else(|| AccessError::UnknownTable {
                alias: alias.to_string(),
            })
    }

    /// Iterates the registered tables in alias order.
    pub fn tables(&self) -> Vec<Arc<TableConfig>> {
        let mut tables: Vec<_> = self.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.alias.cmp(&b.alias));
        tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
