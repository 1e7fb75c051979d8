//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{KeyAttribute, TableSchema};

/// Represents the current state of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub status: TableStatus,
    pub partition_key: Option<String>,
    pub sort_key: Option<String>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { schema: TableSchema },
    /// Table exists with a different key schema. Keys cannot be changed in place.
    KeyMismatch {
        table_name: String,
        expected: String,
        actual: String,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

impl DeployPlan {
    pub fn is_actionable(&self) -> bool {
        matches!(self, DeployPlan::CreateTable { .. })
    }
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

fn describe_keys(partition_key: Option<&str>, sort_key: Option<&str>) -> String {
    match sort_key {
        Some(sort_key) => format!("{} + {}", partition_key.unwrap_or("?"), sort_key),
        None => partition_key.unwrap_or("?").to_string(),
    }
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableSchema) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            schema: desired.clone(),
        };
    };

    let desired_sort = desired.sort_key.as_ref().map(|k| k.name.as_str());
    if state.partition_key.as_deref() == Some(desired.partition_key.name.as_str())
        && state.sort_key.as_deref() == desired_sort
    {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::KeyMismatch {
            table_name: desired.table_name.clone(),
            expected: describe_keys(Some(&desired.partition_key.name), desired_sort),
            actual: describe_keys(state.partition_key.as_deref(), state.sort_key.as_deref()),
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn format_key(role: &str, key: &KeyAttribute) -> String {
    format!("  {}: {} ({})", role, key.name, key.attribute_type.code())
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { schema } => {
            let mut lines = vec![
                format!("+ Create table: {} ({})", schema.table_name, schema.alias),
                format_key("Partition key", &schema.partition_key),
            ];
            if let Some(sk) = &schema.sort_key {
                lines.push(format_key("Sort key", sk));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::KeyMismatch {
            table_name,
            expected,
            actual,
        } => vec![format!(
            "~ Table '{}' has keys {} but the configuration expects {} (not applied)",
            table_name, actual, expected
        )],
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::config::{AttributeType, BillingMode};
    use super::*;

    fn schema() -> TableSchema {
        TableSchema {
            alias: "Products".to_string(),
            table_name: "products".to_string(),
            partition_key: KeyAttribute {
                name: "id".to_string(),
                attribute_type: AttributeType::String,
            },
            sort_key: Some(KeyAttribute {
                name: "timestamp".to_string(),
                attribute_type: AttributeType::Number,
            }),
            billing_mode: BillingMode::PayPerRequest,
        }
    }

    fn state(partition_key: &str, sort_key: Option<&str>) -> TableState {
        TableState {
            status: TableStatus::Active,
            partition_key: Some(partition_key.to_string()),
            sort_key: sort_key.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let plan = calculate_deploy_plan(None, &schema());

        assert!(plan.is_actionable());
        assert_eq!(
            format_deploy_plan(&plan),
            vec![
                "+ Create table: products (Products)",
                "  Partition key: id (S)",
                "  Sort key: timestamp (N)",
                "  Billing: PAY_PER_REQUEST",
            ]
        );
    }

    #[test]
    fn test_matching_table_has_no_changes() {
        let plan = calculate_deploy_plan(Some(&state("id", Some("timestamp"))), &schema());

        assert_eq!(
            plan,
            DeployPlan::NoChanges {
                table_name: "products".to_string()
            }
        );
        assert!(!plan.is_actionable());
    }

    #[test]
    fn test_key_mismatch_is_reported() {
        let plan = calculate_deploy_plan(Some(&state("id", None)), &schema());

        assert_eq!(
            plan,
            DeployPlan::KeyMismatch {
                table_name: "products".to_string(),
                expected: "id + timestamp".to_string(),
                actual: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_destroy_plan() {
        assert_eq!(
            calculate_destroy_plan(None, "products"),
            DestroyPlan::AlreadyGone {
                table_name: "products".to_string()
            }
        );
        let plan = calculate_destroy_plan(Some(&state("id", None)), "products");
        assert_eq!(
            format_destroy_plan(&plan),
            vec!["- Delete table: products (ALL DATA WILL BE LOST)"]
        );
    }
}
