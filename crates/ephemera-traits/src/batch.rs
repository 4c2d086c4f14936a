//! Atomic command batches.
//!
//! A [`Batch`] is submitted to [`KvEngine::exec_atomic`](crate::KvEngine::exec_atomic)
//! and applied by the engine as one unit: no command from another caller can
//! run between two commands of the same batch.

use crate::engine::MAX_EXPIRE_SECS;
use crate::error::{EngineError, Result};

/// A single engine command that may appear inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set several fields of the hash at `key`.
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Attach a time-to-live to `key`. A zero TTL removes the key.
    Expire { key: String, seconds: u64 },
    /// Increment the integer at `key` by one, creating it at zero if missing.
    Incr { key: String },
    /// Remove `key`.
    Delete { key: String },
}

impl Command {
    pub fn key(&self) -> &str {
        match self {
            Command::HashSet { key, .. }
            | Command::Expire { key, .. }
            | Command::Incr { key }
            | Command::Delete { key } => key,
        }
    }
}

/// Reply to one command of an executed batch, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Integer(i64),
    Status(String),
    Nil,
}

impl Reply {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

/// Ordered list of commands executed atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hset_multiple(mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.commands.push(Command::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, seconds: u64) -> Self {
        self.commands.push(Command::Expire {
            key: key.into(),
            seconds,
        });
        self
    }

    pub fn incr(mut self, key: impl Into<String>) -> Self {
        self.commands.push(Command::Incr { key: key.into() });
        self
    }

    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.commands.push(Command::Delete { key: key.into() });
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Reject commands the engine would refuse at execution time.
    ///
    /// Engines run this before applying anything, so an out-of-range TTL
    /// cannot leave the earlier commands of the batch applied on their own.
    pub fn check(&self) -> Result<()> {
        for command in &self.commands {
            if let Command::Expire { key, seconds } = command {
                check_expire_secs(key, *seconds)?;
            }
        }
        Ok(())
    }
}

/// Fail with a protocol error when `seconds` exceeds [`MAX_EXPIRE_SECS`].
pub fn check_expire_secs(key: &str, seconds: u64) -> Result<()> {
    if seconds > MAX_EXPIRE_SECS {
        return Err(EngineError::Protocol(format!(
            "invalid expire time {seconds} for key {key}"
        )));
    }
    Ok(())
}
