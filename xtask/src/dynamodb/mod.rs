//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use dynaccess::storage::dynamodb::DynamoDbStore;
use dynaccess::Database;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the configured tables.
    Deploy(DeployCommand),

    /// Load items from a JSON file into a configured table.
    Seed(SeedCommand),
}

/// Deploy or destroy the configured tables.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the DynamoDB tables of a dynaccess configuration.

By default, this command creates every table registered in the configuration
that does not exist yet, with its partition and sort key schema.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  DYNACCESS_CONFIG    - Configuration file (defaults to dynaccess.json)
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Path to the access configuration.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only deploy the table registered under this alias.
    #[arg(long, value_name = "ALIAS")]
    pub table: Option<String>,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the tables instead of creating them.
    #[arg(long)]
    pub destroy: bool,
}

/// Load items from a JSON file into a configured table.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Insert the items of a JSON file into a configured table.

The file must hold a JSON array of objects, each carrying the table's key
attributes. Items are written in batches of 25; unprocessed writes are
retried with exponential backoff.")]
pub struct SeedCommand {
    /// Path to the access configuration.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Alias of the table to seed.
    #[arg(long, value_name = "ALIAS")]
    pub table: String,

    /// JSON file with the items to insert.
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::Seed(seed_cmd) => run_seed(seed_cmd, &global).await,
    }
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let config_path = cmd.config.unwrap_or_else(dynaccess::config_path_from_env);
    let access_config = dynaccess::load_config(&config_path)?;
    let schemas = config::table_schemas(&access_config, cmd.table.as_deref())?;
    let aws_config = client::AwsConfig::from_env();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Config:"), config_path.display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    if cmd.destroy {
        let mut plans = Vec::with_capacity(schemas.len());
        for schema in &schemas {
            let state = client::get_table_state(&dynamo_client, &schema.table_name).await?;
            plans.push(planning::calculate_destroy_plan(
                state.as_ref(),
                &schema.table_name,
            ));
        }

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in plans.iter().flat_map(planning::format_destroy_plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if plans
            .iter()
            .all(|plan| matches!(plan, planning::DestroyPlan::AlreadyGone { .. }))
        {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm(
                "Are you sure you want to delete these tables? ALL DATA WILL BE LOST",
                false,
            )?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting tables..."));
        }

        for plan in &plans {
            deploy::execute_destroy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Tables destroyed successfully."));
        }
    } else {
        let mut plans = Vec::with_capacity(schemas.len());
        for schema in &schemas {
            let state = client::get_table_state(&dynamo_client, &schema.table_name).await?;
            plans.push(planning::calculate_deploy_plan(state.as_ref(), schema));
        }

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for line in plans.iter().flat_map(planning::format_deploy_plan) {
                if line.starts_with('+') {
                    aprintln!("  {}", p_g(&line));
                } else if line.starts_with('~') {
                    aprintln!("  {}", p_y(&line));
                } else {
                    aprintln!("  {}", line);
                }
            }
            aprintln!();
        }

        if !plans.iter().any(planning::DeployPlan::is_actionable) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm("Apply these changes?", true)?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        for plan in &plans {
            deploy::execute_deploy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}

async fn run_seed(cmd: SeedCommand, global: &crate::Global) -> Result<()> {
    let config_path = cmd.config.unwrap_or_else(dynaccess::config_path_from_env);
    let access_config = dynaccess::load_config(&config_path)?;
    let schema = config::table_schemas(&access_config, Some(&cmd.table))?
        .into_iter()
        .next()
        .ok_or_else(|| DynamodbError::TableNotFound {
            table_name: cmd.table.clone(),
        })?;
    let aws_config = client::AwsConfig::from_env();

    let contents = std::fs::read_to_string(&cmd.file)?;
    let items = seed::parse_seed_items(&contents)?;

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {} ({})", p_b("Table:"), schema.table_name, schema.alias);
        aprintln!("{} {}", p_b("File:"), cmd.file.display());
        aprintln!("{} {}", p_b("Item count:"), items.len());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    if client::get_table_state(&dynamo_client, &schema.table_name)
        .await?
        .is_none()
    {
        return Err(DynamodbError::TableNotFound {
            table_name: schema.table_name,
        });
    }

    if !cmd.force {
        confirm(&format!("Insert {} items?", items.len()), true)?;
    }

    let database = Database::new(&access_config, Arc::new(DynamoDbStore::new(dynamo_client)))?;
    let inserted = seed::seed_items(&database, &cmd.table, items).await?;

    if !global.is_silent() {
        aprintln!("{} {} items inserted.", p_g("Success:"), inserted);
    }

    Ok(())
}
