use anyhow::{Context, Result};
use ephemera_storage::{StorageError, Stores};
use serde_json::json;

use crate::config::CliConfig;
use crate::output::{OutputFormat, json::print_json};

/// Report whether the engine answers PING. Exits with status 1 when it does not.
///
/// An engine that cannot be connected to at all counts as not alive; only an
/// invalid configuration is reported as an error.
pub async fn run(config: &CliConfig, format: OutputFormat) -> Result<()> {
    config
        .redis
        .validate()
        .context("Invalid Redis configuration")?;

    let alive = match Stores::connect(&config.redis).await {
        Ok(stores) => {
            let alive = stores.is_alive().await;
            stores.close();
            alive
        }
        Err(err @ StorageError::Config(_)) => return Err(err.into()),
        Err(err) => {
            tracing::warn!(error = %err, "Could not connect to Redis");
            false
        }
    };

    if format.is_json() {
        print_json(&json!({
            "url": config.redis.redacted_url(),
            "alive": alive,
        }))?;
    } else if alive {
        println!("Redis at {} is alive", config.redis.redacted_url());
    } else {
        println!("Redis at {} is unreachable", config.redis.redacted_url());
    }

    if !alive {
        std::process::exit(1);
    }
    Ok(())
}
