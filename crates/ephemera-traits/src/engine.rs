//! Key-value engine abstraction.
//!
//! The stores only ever talk to the engine through this trait. Implementations
//! are provided by downstream crates (e.g., ephemera-storage ships a Redis
//! engine and an in-memory engine).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::batch::{Batch, Reply};
use crate::error::Result;

/// Canonical reply to a healthy `PING`.
pub const PING_REPLY: &str = "PONG";

/// Largest TTL an engine accepts, in seconds.
///
/// Redis stores expirations as milliseconds in an `i64` and refuses anything
/// that would overflow it with `invalid expire time`.
pub const MAX_EXPIRE_SECS: u64 = i64::MAX as u64 / 1000;

/// Command surface of a remote key-value engine.
///
/// Every method is one round-trip. Implementations must not retry failed
/// commands; failures are reported to the caller as [`EngineError`](crate::EngineError).
#[async_trait]
pub trait KvEngine: Send + Sync {
    /// Send a `PING` and return the engine's raw reply.
    async fn ping(&self) -> Result<String>;

    /// Set several fields of the hash at `key`, creating it if missing.
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()>;

    /// Read every field of the hash at `key`.
    ///
    /// A missing (or expired) key yields an empty map.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Remove `key`. Returns whether it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Attach a TTL to `key`. Returns whether the key existed.
    ///
    /// A TTL above [`MAX_EXPIRE_SECS`] is rejected with a protocol error and
    /// leaves the key untouched. The stores only reach EXPIRE and INCR through
    /// [`exec_atomic`](Self::exec_atomic); the standalone forms serve callers
    /// that need a single command.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool>;

    /// Increment the integer at `key` and return the new value.
    ///
    /// Like [`expire`](Self::expire), kept for single-command callers; the
    /// rate limiter increments inside a batch.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Execute all commands of `batch` as one indivisible unit.
    ///
    /// Returns one [`Reply`] per command, in submission order. A batch that
    /// fails [`Batch::check`] is rejected before any command is applied.
    async fn exec_atomic(&self, batch: Batch) -> Result<Vec<Reply>>;
}
