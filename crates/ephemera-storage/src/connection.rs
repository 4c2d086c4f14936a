//! Connection manager.
//!
//! Owns the one long-lived session to the key-value engine that every store
//! shares. The owning process opens it at startup, hands clones to the
//! stores, and closes it at shutdown.
//!
//! Failed commands are logged and published as [`ConnectionEvent::Error`]
//! before being returned to the caller unchanged. Disconnects the Redis
//! driver notices on its own are published as [`ConnectionEvent::Unreachable`]
//! without waiting for the next command. Nothing here retries.

use std::collections::HashMap;
use std::sync::Arc;

use ephemera_traits::{Batch, EngineError, EngineResult, KvEngine, PING_REPLY, Reply};
use redis::{PushInfo, PushKind};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::RedisEngine;
use crate::error::Result;

const EVENT_CAPACITY: usize = 64;

/// Liveness and error notifications from the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Alive,
    Unreachable { reason: String },
    Error {
        operation: &'static str,
        error: EngineError,
    },
}

/// Shared handle to the engine session. Cheap to clone.
#[derive(Clone)]
pub struct Connection {
    engine: Arc<dyn KvEngine>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl Connection {
    /// Validate `config` and open a Redis session with it.
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let (pushes, push_rx) = mpsc::unbounded_channel();
        let engine = RedisEngine::connect(config, pushes).await?;
        info!(url = %config.redacted_url(), "Connected to key-value engine");

        let connection = Self::from_engine(Arc::new(engine));
        connection.forward_pushes(push_rx);
        Ok(connection)
    }

    /// Wrap an already-open engine.
    pub fn from_engine(engine: Arc<dyn KvEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { engine, events }
    }

    /// Receive liveness and error events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Ping the engine. True only for the canonical `PONG` reply.
    ///
    /// Never fails: an unexpected reply or a transport error both collapse to
    /// `false`.
    pub async fn is_alive(&self) -> bool {
        match self.engine.ping().await {
            Ok(reply) if reply == PING_REPLY => {
                self.publish(ConnectionEvent::Alive);
                true
            }
            Ok(reply) => {
                warn!(reply = %reply, "Unexpected ping reply from engine");
                self.publish(ConnectionEvent::Unreachable {
                    reason: format!("unexpected ping reply: {reply}"),
                });
                false
            }
            Err(err) => {
                warn!(error = %err, "Engine ping failed");
                self.publish(ConnectionEvent::Unreachable {
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Release this handle's share of the session.
    ///
    /// Returns how many handles still hold the engine. The socket closes when
    /// that reaches zero.
    pub fn close(self) -> usize {
        let Self { engine, events: _ } = self;
        let remaining = Arc::strong_count(&engine) - 1;
        drop(engine);

        if remaining == 0 {
            info!("Closed key-value engine connection");
        } else {
            debug!(remaining, "Released key-value engine handle");
        }
        remaining
    }

    /// Publish driver-side notifications from `pushes` until the driver drops
    /// its sender.
    pub(crate) fn forward_pushes(&self, mut pushes: mpsc::UnboundedReceiver<PushInfo>) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(push) = pushes.recv().await {
                match push.kind {
                    PushKind::Disconnection => {
                        warn!("Lost connection to key-value engine");
                        let _ = events.send(ConnectionEvent::Unreachable {
                            reason: "connection to engine lost".to_string(),
                        });
                    }
                    kind => debug!(?kind, "Ignoring push from engine"),
                }
            }
            debug!("Engine push channel closed");
        })
    }

    pub(crate) async fn hset_multiple(
        &self,
        operation: &'static str,
        key: &str,
        fields: &[(String, String)],
    ) -> EngineResult<()> {
        let result = self.engine.hset_multiple(key, fields).await;
        self.observe(operation, result)
    }

    pub(crate) async fn hgetall(
        &self,
        operation: &'static str,
        key: &str,
    ) -> EngineResult<HashMap<String, String>> {
        let result = self.engine.hgetall(key).await;
        self.observe(operation, result)
    }

    pub(crate) async fn del(&self, operation: &'static str, key: &str) -> EngineResult<bool> {
        let result = self.engine.del(key).await;
        self.observe(operation, result)
    }

    pub(crate) async fn exec_atomic(
        &self,
        operation: &'static str,
        batch: Batch,
    ) -> EngineResult<Vec<Reply>> {
        debug!(operation, commands = batch.len(), "Submitting atomic batch");
        let result = self.engine.exec_atomic(batch).await;
        self.observe(operation, result)
    }

    fn observe<T>(&self, operation: &'static str, result: EngineResult<T>) -> EngineResult<T> {
        if let Err(err) = &result {
            warn!(operation, error = %err, "Engine command failed");
            self.publish(ConnectionEvent::Error {
                operation,
                error: err.clone(),
            });
        }
        result
    }

    fn publish(&self, event: ConnectionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::engine::MemoryEngine;

    /// Engine whose ping reply is scripted and whose other commands fail with
    /// a transport error.
    pub(crate) struct ScriptedEngine {
        pub ping: EngineResult<String>,
        pub calls: AtomicUsize,
    }

    impl ScriptedEngine {
        pub(crate) fn new(ping: EngineResult<String>) -> Self {
            Self {
                ping,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn unreachable() -> Self {
            Self::new(Err(EngineError::transport("connection refused")))
        }

        fn fail<T>(&self) -> EngineResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::transport("connection reset by peer"))
        }
    }

    #[async_trait]
    impl KvEngine for ScriptedEngine {
        async fn ping(&self) -> EngineResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ping.clone()
        }

        async fn hset_multiple(&self, _key: &str, _fields: &[(String, String)]) -> EngineResult<()> {
            self.fail()
        }

        async fn hgetall(&self, _key: &str) -> EngineResult<HashMap<String, String>> {
            self.fail()
        }

        async fn del(&self, _key: &str) -> EngineResult<bool> {
            self.fail()
        }

        async fn expire(&self, _key: &str, _seconds: u64) -> EngineResult<bool> {
            self.fail()
        }

        async fn incr(&self, _key: &str) -> EngineResult<i64> {
            self.fail()
        }

        async fn exec_atomic(&self, _batch: Batch) -> EngineResult<Vec<Reply>> {
            self.fail()
        }
    }

    #[tokio::test]
    async fn test_alive_on_canonical_reply() {
        let connection = Connection::from_engine(Arc::new(MemoryEngine::new()));
        let mut events = connection.subscribe();

        assert!(connection.is_alive().await);
        assert_eq!(events.recv().await.unwrap(), ConnectionEvent::Alive);
    }

    #[tokio::test]
    async fn test_not_alive_on_other_reply() {
        for reply in ["pong", "LOADING", "", "PONG "] {
            let engine = ScriptedEngine::new(Ok(reply.to_string()));
            let connection = Connection::from_engine(Arc::new(engine));
            assert!(!connection.is_alive().await, "{reply:?} must not count as alive");
        }
    }

    #[tokio::test]
    async fn test_not_alive_on_transport_error() {
        let connection = Connection::from_engine(Arc::new(ScriptedEngine::unreachable()));
        let mut events = connection.subscribe();

        assert!(!connection.is_alive().await);
        assert!(matches!(
            events.recv().await.unwrap(),
            ConnectionEvent::Unreachable { reason } if reason.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn test_not_alive_on_timeout() {
        let connection = Connection::from_engine(Arc::new(ScriptedEngine::new(Err(EngineError::Timeout))));
        assert!(!connection.is_alive().await);
    }

    #[tokio::test]
    async fn test_command_errors_are_published_and_returned() {
        let engine = Arc::new(ScriptedEngine::unreachable());
        let connection = Connection::from_engine(engine.clone());
        let mut events = connection.subscribe();

        let err = connection.hgetall("secret.get", "secret:x").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1, "no retry expected");

        match events.recv().await.unwrap() {
            ConnectionEvent::Error { operation, error } => {
                assert_eq!(operation, "secret.get");
                assert_eq!(error, err);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publishing_without_subscribers_does_not_fail() {
        let connection = Connection::from_engine(Arc::new(ScriptedEngine::unreachable()));
        assert!(connection.del("secret.delete", "secret:x").await.is_err());
        assert!(!connection.is_alive().await);
        connection.close();
    }

    #[tokio::test]
    async fn test_disconnect_push_is_published() {
        let connection = Connection::from_engine(Arc::new(MemoryEngine::new()));
        let mut events = connection.subscribe();
        let (pushes, push_rx) = mpsc::unbounded_channel();
        let forwarder = connection.forward_pushes(push_rx);

        pushes
            .send(PushInfo {
                kind: PushKind::Message,
                data: vec![],
            })
            .unwrap();
        pushes
            .send(PushInfo {
                kind: PushKind::Disconnection,
                data: vec![],
            })
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ConnectionEvent::Unreachable {
                reason: "connection to engine lost".to_string()
            }
        );

        drop(pushes);
        forwarder.await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_releases_engine_handle() {
        let engine: Arc<dyn KvEngine> = Arc::new(MemoryEngine::new());
        let weak = Arc::downgrade(&engine);
        let connection = Connection::from_engine(engine);
        let clone = connection.clone();

        assert_eq!(clone.close(), 1);
        assert!(weak.upgrade().is_some());
        assert_eq!(connection.close(), 0);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config_before_connecting() {
        let config = EngineConfig {
            port: 0,
            ..Default::default()
        };
        let result = Connection::open(&config).await;
        assert!(matches!(result, Err(crate::StorageError::Config(_))));
    }
}
