use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::RetryPolicy;
use crate::error::{AccessError, Result};

use super::{TableConfig, TableRegistry};

const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 50;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Initialisation input: the tables to register and how batch writes are retried.
///
/// Unknown fields are ignored, so configuration files may carry extra metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}

impl AccessConfig {
    pub fn new(max_retries: u32, tables: Vec<TableConfig>) -> Self {
        Self {
            max_retries,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            tables,
        }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AccessConfig = serde_json::from_str(json)
            .map_err(|e| AccessError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay_ms = base.as_millis() as u64;
        self.retry_max_delay_ms = max.as_millis() as u64;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(AccessError::InvalidConfig(format!(
                "retryBaseDelayMs ({}) exceeds retryMaxDelayMs ({})",
                self.retry_base_delay_ms, self.retry_max_delay_ms
            )));
        }
        // Builds a throwaway registry to surface duplicate aliases early.
        self.registry().map(|_| ())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn registry(&self) -> Result<TableRegistry> {
        TableRegistry::from_tables(self.tables.iter().cloned())
    }
}
