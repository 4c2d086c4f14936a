//! Engine error types.

use thiserror::Error;

/// Failure of a single round-trip to the key-value engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Connection lost, refused, or otherwise unusable.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("engine did not reply in time")]
    Timeout,

    /// The engine rejected the command or replied with something unparsable.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The key holds a value of a different kind than the command expects.
    #[error("wrong value type at key {0}")]
    WrongType(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl EngineError {
    /// Create a transport error from any error type.
    #[inline]
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create a protocol error from any error type.
    #[inline]
    pub fn protocol<E: std::fmt::Display>(err: E) -> Self {
        Self::Protocol(err.to_string())
    }

    /// Whether the failure happened below the command level (lost or slow
    /// connection) rather than being a rejection by the engine.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(EngineError::transport("connection reset").is_transport());
        assert!(EngineError::Timeout.is_transport());
        assert!(!EngineError::protocol("ERR syntax").is_transport());
        assert!(!EngineError::WrongType("k".into()).is_transport());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = EngineError::transport("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
