//! User credential storage.
//!
//! Users live at `user:{username}` with no expiration. The password is stored
//! exactly as given; hashing it first is the caller's job.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::Connection;
use crate::error::{Result, StorageError};
use crate::keys::user_key;

const FIELD_USERNAME: &str = "username";
const FIELD_PASSWORD: &str = "password";
const FIELD_TOKEN: &str = "basic_auth_token";

const TOKEN_BYTES: usize = 16;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub basic_auth_token: String,
}

impl UserRecord {
    fn into_fields(self) -> Vec<(String, String)> {
        vec![
            (FIELD_USERNAME.to_string(), self.username),
            (FIELD_PASSWORD.to_string(), self.password),
            (FIELD_TOKEN.to_string(), self.basic_auth_token),
        ]
    }

    fn from_fields(key: &str, mut fields: HashMap<String, String>) -> Result<Option<Self>> {
        if fields.is_empty() {
            return Ok(None);
        }

        let mut take = |field: &str| {
            fields
                .remove(field)
                .ok_or_else(|| StorageError::invalid_record(key, format!("missing {field} field")))
        };

        Ok(Some(Self {
            username: take(FIELD_USERNAME)?,
            password: take(FIELD_PASSWORD)?,
            basic_auth_token: take(FIELD_TOKEN)?,
        }))
    }
}

/// Generate an opaque, URL-safe authentication token.
///
/// 128 bits from the thread-local CSPRNG, base64url without padding. Tokens are
/// unique with overwhelming probability; nothing checks for collisions.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// User storage over the shared engine connection.
#[derive(Clone)]
pub struct UserStore {
    connection: Connection,
}

impl UserStore {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Create or replace the user, issuing a fresh token.
    ///
    /// Re-creating an existing username overwrites its password and token.
    pub async fn create(&self, username: &str, password: &str) -> Result<UserRecord> {
        let key = user_key(username);
        let record = UserRecord {
            username: username.to_string(),
            password: password.to_string(),
            basic_auth_token: generate_token(),
        };

        self.connection
            .hset_multiple("user.create", &key, &record.clone().into_fields())
            .await?;

        debug!(key = %key, "Created user");
        Ok(record)
    }

    /// Read a user. `None` when the username is unknown.
    pub async fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        let key = user_key(username);
        let fields = self.connection.hgetall("user.get", &key).await?;
        UserRecord::from_fields(&key, fields)
    }

    /// Remove a user. Removing an unknown username succeeds.
    pub async fn delete(&self, username: &str) -> Result<()> {
        let key = user_key(username);
        let existed = self.connection.del("user.delete", &key).await?;
        debug!(key = %key, existed, "Deleted user");
        Ok(())
    }
}
