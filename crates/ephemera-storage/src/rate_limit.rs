//! Sliding-window rate limiting keyed by client address.
//!
//! Each hit increments `rate_limit:{client}` and resets its expiration to the
//! window length in the same atomic batch, so a counter can never be left
//! without a TTL and no increment is ever lost between callers. Because every
//! hit pushes the expiration out again, the window slides: the counter only
//! resets after a full window with no traffic.

use ephemera_traits::{Batch, EngineError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::{Result, StorageError};
use crate::keys::rate_limit_key;

/// Requests allowed per window before a client is limited.
pub const DEFAULT_RATE_LIMIT_QTY: u64 = 100;
/// Window length in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    pub limit: u64,
    pub window_secs: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RATE_LIMIT_QTY,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

impl RateLimitPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(StorageError::config("Rate limit must be at least 1"));
        }
        if self.window_secs == 0 {
            return Err(StorageError::config(
                "Rate limit window must be at least 1 second",
            ));
        }
        Ok(())
    }
}

/// Outcome of one counted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitHit {
    /// Requests seen in the current window, this one included.
    pub count: u64,
    /// True once `count` is strictly above the policy limit.
    pub limited: bool,
}

#[derive(Clone)]
pub struct RateLimiter {
    connection: Connection,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    /// Limiter with the default 100 requests / 60 seconds policy.
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            policy: RateLimitPolicy::default(),
        }
    }

    pub fn with_policy(connection: Connection, policy: RateLimitPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { connection, policy })
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Count a request from `client` and report whether it is over the limit.
    pub async fn hit(&self, client: &str) -> Result<RateLimitHit> {
        let key = rate_limit_key(client);
        let batch = Batch::new()
            .incr(&key)
            .expire(&key, self.policy.window_secs);

        let replies = self.connection.exec_atomic("rate_limit.hit", batch).await?;
        let count = replies
            .first()
            .and_then(|reply| reply.as_integer())
            .ok_or_else(|| EngineError::UnexpectedReply(format!("{replies:?}")))?;
        let count = u64::try_from(count).unwrap_or_default();

        let limited = count > self.policy.limit;
        if limited {
            info!(key = %key, count, limit = self.policy.limit, "Rate limit exceeded");
        } else {
            debug!(key = %key, count, "Rate limit hit");
        }

        Ok(RateLimitHit { count, limited })
    }

    /// Count a request from `client`. True means the request is limited.
    pub async fn check(&self, client: &str) -> Result<bool> {
        Ok(self.hit(client).await?.limited)
    }
}
