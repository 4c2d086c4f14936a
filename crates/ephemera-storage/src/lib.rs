//! Ephemera Storage - Ephemeral records on a remote key-value engine
//!
//! This crate manages three kinds of records, all owned by the engine
//! (Redis-protocol) and never cached locally:
//!
//! - secrets: short-lived, optionally password-gated payloads
//! - users: credential records with a generated authentication token
//! - rate-limit counters: per-client sliding-window request counts
//!
//! # Architecture
//!
//! Every store holds a clone of one [`Connection`]. Multi-command writes that
//! must not be observed half-applied (secret + expiration, increment +
//! expiration) go to the engine as a single atomic batch. Failures are never
//! retried; they surface to the caller.
//!
//! # Keys
//!
//! - `secret:{id}` - Secret hash, expires
//! - `user:{username}` - User hash, no expiration
//! - `rate_limit:{client}` - Request counter, sliding expiration

pub mod config;
pub mod connection;
pub mod engine;
pub mod keys;
pub mod rate_limit;
pub mod secrets;
pub mod ttl;
pub mod users;

mod error;

pub use config::EngineConfig;
pub use connection::{Connection, ConnectionEvent};
pub use engine::{MemoryEngine, RedisEngine};
pub use error::{Result, StorageError};
pub use rate_limit::{RateLimitHit, RateLimitPolicy, RateLimiter};
pub use secrets::{NewSecret, SecretRecord, SecretStore};
pub use ttl::{DEFAULT_SECRET_TTL_SECS, is_valid_ttl, resolve_ttl};
pub use users::{UserRecord, UserStore};

/// All stores, sharing one engine connection.
#[derive(Clone)]
pub struct Stores {
    connection: Connection,
    pub secrets: SecretStore,
    pub users: UserStore,
    pub rate_limiter: RateLimiter,
}

impl Stores {
    /// Build every store on top of `connection`.
    pub fn new(connection: Connection) -> Self {
        Self {
            secrets: SecretStore::new(connection.clone()),
            users: UserStore::new(connection.clone()),
            rate_limiter: RateLimiter::new(connection.clone()),
            connection,
        }
    }

    /// Open a connection from `config` and build every store on it.
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(Connection::open(config).await?))
    }

    /// Get a reference to the shared connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn is_alive(&self) -> bool {
        self.connection.is_alive().await
    }

    /// Drop every store and release the shared connection.
    ///
    /// Returns how many handles to the engine are still held elsewhere.
    pub fn close(self) -> usize {
        let Self {
            connection,
            secrets,
            users,
            rate_limiter,
        } = self;
        drop((secrets, users, rate_limiter));
        connection.close()
    }
}
