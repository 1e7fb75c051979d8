use std::{env, fs, path::Path, path::PathBuf};

use dynaccess_core::table::AccessConfig;
use dynaccess_core::{AccessError, Result};

const DEFAULT_CONFIG_PATH: &str = "dynaccess.json";

/// Path of the access configuration file.
///
/// Environment variables:
/// - `DYNACCESS_CONFIG` - Path to the JSON configuration (default: "dynaccess.json")
pub fn config_path_from_env() -> PathBuf {
    env::var("DYNACCESS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Reads and validates an [`AccessConfig`] from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AccessConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        AccessError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
    })?;
    let config = AccessConfig::from_json(&contents)?;

    tracing::debug!(
        path = %path.display(),
        tables = config.tables.len(),
        max_retries = config.max_retries,
        "Loaded access configuration"
    );

    Ok(config)
}
