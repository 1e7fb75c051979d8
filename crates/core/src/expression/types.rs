use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{AccessError, Result};
use crate::key::{cast, KeyValue};
use crate::table::TableConfig;

use super::builder::{
    attribute_names, attribute_values, filter_expression, remove_expression, update_expression,
};
use super::AttributeMap;

const CONTAINS_VALUE_PLACEHOLDER: &str = ":arrayContainsValue";

/// A rendered expression with its placeholder maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, Value>,
}

// ============================================================================
// Update
// ============================================================================

/// `SET` over defined attributes and `REMOVE` over attribute names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    pub set: AttributeMap,
    pub remove: Vec<String>,
}

impl UpdateExpression {
    pub fn new(set: AttributeMap, remove: Vec<String>) -> Self {
        Self { set, remove }
    }

    /// Attribute names that will actually be removed.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.remove
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// True when neither clause has anything to do.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed().next().is_none()
    }

    pub fn render(&self) -> Rendered {
        let mut clauses = Vec::new();
        if !self.set.is_empty() {
            clauses.push(format!("SET {}", update_expression(&self.set)));
        }
        if self.removed().next().is_some() {
            clauses.push(format!("REMOVE {}", remove_expression(&self.remove)));
        }

        let mut names = attribute_names(&self.set);
        for name in self.removed() {
            names.insert(format!("#{name}"), name.to_string());
        }

        Rendered {
            expression: clauses.join(" "),
            names,
            values: attribute_values(&self.set),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// `contains(#array, :value)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayContains {
    pub array_name: String,
    pub value: Value,
}

impl ArrayContains {
    pub fn new(array_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            array_name: array_name.into(),
            value: value.into(),
        }
    }

    /// A blank array name or a null/empty value makes the clause a no-op.
    fn is_active(&self) -> bool {
        !self.array_name.is_empty()
            && !matches!(&self.value, Value::Null)
            && self.value.as_str() != Some("")
    }
}

/// Scan filter: equality over the defined attributes plus an optional `contains` clause, all
/// joined with `and`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub equals: AttributeMap,
    pub contains: Option<ArrayContains>,
}

impl Filter {
    pub fn new(equals: Option<AttributeMap>, contains: Option<ArrayContains>) -> Self {
        Self {
            equals: equals.unwrap_or_default(),
            contains,
        }
    }

    /// The `contains` clause, when it takes part in the filter.
    pub fn active_contains(&self) -> Option<&ArrayContains> {
        self.contains.as_ref().filter(|c| c.is_active())
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.active_contains().is_none()
    }

    /// Renders the filter, or `None` when it would match everything.
    pub fn render(&self) -> Option<Rendered> {
        if self.is_empty() {
            return None;
        }

        let mut clauses = Vec::new();
        let mut names = attribute_names(&self.equals);
        let mut values = attribute_values(&self.equals);

        if !self.equals.is_empty() {
            clauses.push(filter_expression(&self.equals));
        }
        if let Some(contains) = self.active_contains() {
            let placeholder = format!("#{}", contains.array_name);
            // An equality on an attribute named like the placeholder already owns it.
            let mut value_placeholder = CONTAINS_VALUE_PLACEHOLDER.to_string();
            while values.contains_key(&value_placeholder) {
                value_placeholder.push('_');
            }
            clauses.push(format!("contains({placeholder}, {value_placeholder})"));
            names.insert(placeholder, contains.array_name.clone());
            values.insert(value_placeholder, contains.value.clone());
        }

        Some(Rendered {
            expression: clauses.join(" and "),
            names,
            values,
        })
    }
}

// ============================================================================
// Key condition
// ============================================================================

/// Query key condition: partition equality and an optional sort-key prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub partition_key_name: String,
    pub partition_value: KeyValue,
    pub sort_key_name: String,
    pub sort_prefix: Option<String>,
}

impl KeyCondition {
    /// Builds the condition for a sort-key table. The partition value is cast to the partition
    /// key type.
    pub fn for_table(
        table: &TableConfig,
        partition: &str,
        sort_prefix: Option<&str>,
    ) -> Result<Self> {
        let sort_key = table
            .sort_key
            .as_ref()
            .ok_or_else(|| AccessError::MissingSortKey {
                table: table.name.clone(),
            })?;

        Ok(Self {
            partition_key_name: table.partition_key.name.clone(),
            partition_value: cast(partition, table.partition_key.key_type),
            sort_key_name: sort_key.name.clone(),
            sort_prefix: sort_prefix.map(str::to_string),
        })
    }

    pub fn render(&self) -> Rendered {
        let mut rendered = Rendered {
            expression: "#partitionKeyName = :partitionKeyValue".to_string(),
            ..Default::default()
        };
        rendered.names.insert(
            "#partitionKeyName".to_string(),
            self.partition_key_name.clone(),
        );
        rendered.values.insert(
            ":partitionKeyValue".to_string(),
            self.partition_value.to_value(),
        );

        if let Some(prefix) = &self.sort_prefix {
            rendered
                .expression
                .push_str(" AND begins_with(#sortKeyName, :sortKeyBeginsWithValue)");
            rendered
                .names
                .insert("#sortKeyName".to_string(), self.sort_key_name.clone());
            rendered.values.insert(
                ":sortKeyBeginsWithValue".to_string(),
                Value::String(prefix.clone()),
            );
        }

        rendered
    }
}
