//! Secret storage - short-lived, optionally password-gated records.
//!
//! A secret is a hash at `secret:{id}` with a `secret` field and an optional
//! `password` field. It is written once, together with its expiration, in a
//! single atomic batch and never updated afterwards. It disappears either on
//! explicit deletion or when the engine expires it; readers cannot tell the
//! two apart.

use std::collections::HashMap;

use ephemera_traits::Batch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{Result, StorageError};
use crate::keys::secret_key;
use crate::ttl::resolve_ttl;

const FIELD_SECRET: &str = "secret";
const FIELD_PASSWORD: &str = "password";

/// Input for [`SecretStore::create`].
///
/// `ttl` is kept as raw JSON; it is validated by the store and replaced by the
/// default lifetime when invalid or absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSecret {
    pub id: String,
    pub secret: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ttl: Option<Value>,
}

/// A stored secret as read back from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl SecretRecord {
    /// Whether reading the secret requires a password.
    pub fn is_password_protected(&self) -> bool {
        self.password.is_some()
    }

    fn from_fields(key: &str, mut fields: HashMap<String, String>) -> Result<Option<Self>> {
        if fields.is_empty() {
            return Ok(None);
        }

        let secret = fields
            .remove(FIELD_SECRET)
            .ok_or_else(|| StorageError::invalid_record(key, "missing secret field"))?;

        Ok(Some(Self {
            secret,
            password: fields.remove(FIELD_PASSWORD),
        }))
    }
}

/// Secret storage over the shared engine connection.
#[derive(Clone)]
pub struct SecretStore {
    connection: Connection,
}

impl SecretStore {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Write a secret and its expiration in one atomic batch.
    ///
    /// Returns the TTL that was applied, in seconds. A TTL of zero makes the
    /// engine drop the record immediately. An empty password is treated as no
    /// password.
    pub async fn create(&self, new: &NewSecret) -> Result<u64> {
        let key = secret_key(&new.id);
        let ttl = resolve_ttl(new.ttl.as_ref());

        let mut fields = vec![(FIELD_SECRET.to_string(), new.secret.clone())];
        if let Some(password) = new.password.as_deref().filter(|p| !p.is_empty()) {
            fields.push((FIELD_PASSWORD.to_string(), password.to_string()));
        }

        let batch = Batch::new().hset_multiple(&key, fields).expire(&key, ttl);
        self.connection.exec_atomic("secret.create", batch).await?;

        debug!(key = %key, ttl, "Created secret");
        Ok(ttl)
    }

    /// Read a secret. `None` when it never existed or has expired.
    pub async fn get(&self, id: &str) -> Result<Option<SecretRecord>> {
        let key = secret_key(id);
        let fields = self.connection.hgetall("secret.get", &key).await?;
        SecretRecord::from_fields(&key, fields)
    }

    /// Remove a secret regardless of its remaining lifetime.
    ///
    /// Deleting a missing secret succeeds.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let key = secret_key(id);
        let existed = self.connection.del("secret.delete", &key).await?;
        debug!(key = %key, existed, "Deleted secret");
        Ok(())
    }
}
