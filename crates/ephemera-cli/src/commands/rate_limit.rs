use anyhow::Result;
use ephemera_storage::Stores;
use serde_json::json;

use crate::cli::RateLimitCommands;
use crate::output::{OutputFormat, json::print_json};

pub async fn run(stores: &Stores, command: RateLimitCommands, format: OutputFormat) -> Result<()> {
    match command {
        RateLimitCommands::Check { client } => check(stores, &client, format).await,
    }
}

async fn check(stores: &Stores, client: &str, format: OutputFormat) -> Result<()> {
    let policy = stores.rate_limiter.policy();
    let hit = stores.rate_limiter.hit(client).await?;

    if format.is_json() {
        return print_json(&json!({
            "client": client,
            "count": hit.count,
            "limit": policy.limit,
            "window_secs": policy.window_secs,
            "limited": hit.limited,
        }));
    }

    let decision = if hit.limited { "limited" } else { "allowed" };
    println!(
        "{}: {} ({}/{} in {}s window)",
        client, decision, hit.count, policy.limit, policy.window_secs
    );
    Ok(())
}
