//! CLI setup module
//!
//! Opens the shared engine connection for CLI usage.

use anyhow::{Context, Result};
use ephemera_storage::Stores;

use crate::config::CliConfig;

/// Validate the configuration and connect every store.
pub async fn prepare_stores(config: &CliConfig) -> Result<Stores> {
    config
        .redis
        .validate()
        .context("Invalid Redis configuration")?;

    Stores::connect(&config.redis)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.redis.redacted_url()))
}
