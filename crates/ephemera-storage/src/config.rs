//! Engine connection configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{Result, StorageError};

// Default configuration constants
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;

/// Connection parameters for the key-value engine.
///
/// Timeouts are transport settings; no store operation adds a timeout of its
/// own on top of them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub response_timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: false,
            user: None,
            password: None,
            connect_timeout_secs: None,
            response_timeout_secs: None,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("response_timeout_secs", &self.response_timeout_secs)
            .finish()
    }
}

impl EngineConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(StorageError::config("Redis host must not be empty"));
        }

        if self.port == 0 {
            return Err(StorageError::config(
                "Redis port must be between 1 and 65535",
            ));
        }

        if self.user.is_some() && self.password.is_none() {
            return Err(StorageError::config(
                "Redis user requires a password",
            ));
        }

        if self.connect_timeout_secs == Some(0) || self.response_timeout_secs == Some(0) {
            return Err(StorageError::config(
                "Redis timeouts must be at least 1 second",
            ));
        }

        Ok(())
    }

    /// Connection URL in the `redis://` / `rediss://` scheme.
    ///
    /// Credentials are percent-encoded so that passwords containing `@`, `:`
    /// or `/` survive URL parsing.
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };

        let auth = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (None, Some(password)) => format!(":{}@", urlencoding::encode(password)),
            _ => String::new(),
        };

        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        format!("{scheme}://{auth}{host}:{}", self.port)
    }

    /// Same as [`connection_url`](Self::connection_url) with the password masked.
    pub fn redacted_url(&self) -> String {
        let masked = Self {
            password: self.password.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        };
        masked.connection_url()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_secs.map(Duration::from_secs)
    }
}
