use anyhow::{Result, anyhow};
use ephemera_storage::Stores;
use serde_json::json;

use crate::cli::UserCommands;
use crate::output::{OutputFormat, json::print_json, table};

pub async fn run(stores: &Stores, command: UserCommands, format: OutputFormat) -> Result<()> {
    match command {
        UserCommands::Create { username, password } => {
            create_user(stores, &username, &password, format).await
        }
        UserCommands::Get { username } => get_user(stores, &username, format).await,
        UserCommands::Delete { username } => delete_user(stores, &username, format).await,
    }
}

async fn create_user(
    stores: &Stores,
    username: &str,
    password: &str,
    format: OutputFormat,
) -> Result<()> {
    let user = stores.users.create(username, password).await?;

    if format.is_json() {
        return print_json(&json!({
            "username": user.username,
            "basic_auth_token": user.basic_auth_token,
        }));
    }

    println!("Created user: {}", user.username);
    println!("Token: {}", user.basic_auth_token);
    Ok(())
}

async fn get_user(stores: &Stores, username: &str, format: OutputFormat) -> Result<()> {
    let user = stores
        .users
        .get(username)
        .await?
        .ok_or_else(|| anyhow!("User not found: {}", username))?;

    // The stored password is never echoed back
    if format.is_json() {
        return print_json(&json!({
            "username": user.username,
            "basic_auth_token": user.basic_auth_token,
        }));
    }

    table::print_table(table::record_table([
        ("Username", user.username),
        ("Token", user.basic_auth_token),
    ]))
}

async fn delete_user(stores: &Stores, username: &str, format: OutputFormat) -> Result<()> {
    stores.users.delete(username).await?;

    if format.is_json() {
        return print_json(&json!({ "deleted": username }));
    }

    println!("Deleted user: {}", username);
    Ok(())
}
