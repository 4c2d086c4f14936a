use anyhow::{Result, anyhow};
use chrono::{TimeDelta, Utc};
use ephemera_storage::{NewSecret, Stores};
use serde_json::{Value, json};

use crate::cli::SecretCommands;
use crate::output::{OutputFormat, json::print_json, table};

pub async fn run(stores: &Stores, command: SecretCommands, format: OutputFormat) -> Result<()> {
    match command {
        SecretCommands::Create {
            id,
            secret,
            password,
            ttl,
        } => create_secret(stores, id, secret, password, ttl, format).await,
        SecretCommands::Get { id } => get_secret(stores, &id, format).await,
        SecretCommands::Delete { id } => delete_secret(stores, &id, format).await,
    }
}

async fn create_secret(
    stores: &Stores,
    id: Option<String>,
    secret: String,
    password: Option<String>,
    ttl: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let new = NewSecret {
        id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        secret,
        password,
        ttl: ttl.map(Value::String),
    };

    let applied = stores.secrets.create(&new).await?;
    let expires_at = i64::try_from(applied)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta));

    if format.is_json() {
        return print_json(&json!({
            "id": new.id,
            "ttl": applied,
            "expires_at": expires_at.map(|at| at.to_rfc3339()),
        }));
    }

    println!("Created secret: {}", new.id);
    match expires_at {
        Some(at) => println!("Expires: {} ({}s)", at.to_rfc3339(), applied),
        None => println!("Expires: in {}s", applied),
    }
    Ok(())
}

async fn get_secret(stores: &Stores, id: &str, format: OutputFormat) -> Result<()> {
    let record = stores
        .secrets
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("Secret not found: {}", id))?;

    if format.is_json() {
        return print_json(&json!({
            "id": id,
            "secret": record.secret,
            "password_protected": record.is_password_protected(),
        }));
    }

    let protected = if record.is_password_protected() {
        "yes"
    } else {
        "no"
    };
    table::print_table(table::record_table([
        ("ID", id.to_string()),
        ("Secret", record.secret),
        ("Password protected", protected.to_string()),
    ]))
}

async fn delete_secret(stores: &Stores, id: &str, format: OutputFormat) -> Result<()> {
    stores.secrets.delete(id).await?;

    if format.is_json() {
        return print_json(&json!({ "deleted": id }));
    }

    println!("Deleted secret: {}", id);
    Ok(())
}
