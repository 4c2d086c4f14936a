//! CLI configuration file support
//!
//! Loads configuration from ~/.config/ephemera/config.toml
//!
//! ```toml
//! [redis]
//! host = "cache.internal"
//! port = 6380
//! tls = true
//! user = "app"
//! password = "..."
//! response_timeout_secs = 5
//! ```

use anyhow::{Context, Result};
use ephemera_storage::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ConnectionArgs;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Redis connection settings
    #[serde(default)]
    pub redis: EngineConfig,
}

impl CliConfig {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing file at the default path means defaults; a missing file at
    /// an explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ephemera").join("config.toml"))
    }

    /// Apply command-line / environment overrides on top of the file values.
    pub fn with_overrides(mut self, args: &ConnectionArgs) -> Self {
        let redis = &mut self.redis;
        if let Some(host) = &args.host {
            redis.host = host.clone();
        }
        if let Some(port) = args.port {
            redis.port = port;
        }
        if let Some(tls) = args.tls {
            redis.tls = tls;
        }
        if let Some(user) = &args.user {
            redis.user = Some(user.clone());
        }
        if let Some(password) = &args.password {
            redis.password = Some(password.clone());
        }
        self
    }
}
