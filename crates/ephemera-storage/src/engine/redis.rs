//! Redis engine.

use std::collections::HashMap;

use async_trait::async_trait;
use ephemera_traits::{
    Batch, Command, EngineError, EngineResult, KvEngine, Reply, check_expire_secs,
};
use redis::aio::MultiplexedConnection;
use redis::{
    AsyncCommands, AsyncConnectionConfig, Client, IntoConnectionInfo, ProtocolVersion, PushInfo,
    RedisError, Value,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::EngineConfig;
use crate::error::{Result, StorageError};

/// Engine backed by a single multiplexed Redis connection.
///
/// Cloning is cheap and every clone shares the same socket; the connection
/// closes once the last clone is dropped. Commands are never retried.
#[derive(Clone)]
pub struct RedisEngine {
    conn: MultiplexedConnection,
}

impl RedisEngine {
    /// Open the connection described by `config`.
    ///
    /// The driver reports out-of-band events (most importantly
    /// [`PushKind::Disconnection`](redis::PushKind::Disconnection)) on `pushes`.
    /// The driver only accepts a push sender on RESP3, so the session speaks
    /// RESP3.
    pub async fn connect(config: &EngineConfig, pushes: UnboundedSender<PushInfo>) -> Result<Self> {
        let mut info = config
            .connection_url()
            .as_str()
            .into_connection_info()
            .map_err(StorageError::config)?;
        info.redis.protocol = ProtocolVersion::RESP3;
        let client = Client::open(info).map_err(StorageError::config)?;

        let mut connection_config = AsyncConnectionConfig::new().set_push_sender(pushes);
        if let Some(timeout) = config.connect_timeout() {
            connection_config = connection_config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = config.response_timeout() {
            connection_config = connection_config.set_response_timeout(timeout);
        }

        let conn = client
            .get_multiplexed_async_connection_with_config(&connection_config)
            .await
            .map_err(|err| engine_error(err, ""))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KvEngine for RedisEngine {
    async fn ping(&self) -> EngineResult<String> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|err| engine_error(err, ""))
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> EngineResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset_multiple(key, fields)
            .await
            .map_err(|err| engine_error(err, key))?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> EngineResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(|err| engine_error(err, key))
    }

    async fn del(&self, key: &str) -> EngineResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(|err| engine_error(err, key))?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, seconds: u64) -> EngineResult<bool> {
        let seconds = expire_arg(key, seconds)?;
        let mut conn = self.conn.clone();
        let applied: i64 = conn
            .expire(key, seconds)
            .await
            .map_err(|err| engine_error(err, key))?;
        Ok(applied > 0)
    }

    async fn incr(&self, key: &str) -> EngineResult<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1).await.map_err(|err| engine_error(err, key))
    }

    async fn exec_atomic(&self, batch: Batch) -> EngineResult<Vec<Reply>> {
        // EXEC has no rollback, so refuse up front what Redis would refuse mid-batch
        batch.check()?;

        let first_key = batch
            .commands()
            .first()
            .map(|command| command.key().to_string())
            .unwrap_or_default();

        // MULTI ... EXEC; the pipeline result is the EXEC array
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in batch.into_commands() {
            match command {
                Command::HashSet { key, fields } => {
                    pipe.hset_multiple(key, fields.as_slice());
                }
                Command::Expire { key, seconds } => {
                    let seconds = expire_arg(&key, seconds)?;
                    pipe.expire(key, seconds);
                }
                Command::Incr { key } => {
                    pipe.incr(key, 1);
                }
                Command::Delete { key } => {
                    pipe.del(key);
                }
            }
        }

        let mut conn = self.conn.clone();
        let values: Vec<Value> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|err| engine_error(err, &first_key))?;

        values.into_iter().map(reply_from_value).collect()
    }
}

fn expire_arg(key: &str, seconds: u64) -> EngineResult<i64> {
    check_expire_secs(key, seconds)?;
    i64::try_from(seconds).map_err(EngineError::protocol)
}

fn reply_from_value(value: Value) -> EngineResult<Reply> {
    match value {
        Value::Okay => Ok(Reply::Ok),
        Value::Nil => Ok(Reply::Nil),
        Value::Int(value) => Ok(Reply::Integer(value)),
        Value::Boolean(value) => Ok(Reply::Integer(value as i64)),
        Value::SimpleString(status) => Ok(Reply::Status(status)),
        other => Err(EngineError::UnexpectedReply(format!("{other:?}"))),
    }
}

fn engine_error(err: RedisError, key: &str) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        EngineError::transport(err)
    } else if err.code() == Some("WRONGTYPE") {
        EngineError::WrongType(key.to_string())
    } else {
        EngineError::protocol(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_mapping() {
        assert_eq!(reply_from_value(Value::Okay).unwrap(), Reply::Ok);
        assert_eq!(reply_from_value(Value::Int(3)).unwrap(), Reply::Integer(3));
        assert_eq!(reply_from_value(Value::Nil).unwrap(), Reply::Nil);
        assert_eq!(
            reply_from_value(Value::SimpleString("QUEUED".into())).unwrap(),
            Reply::Status("QUEUED".to_string())
        );
        assert!(matches!(
            reply_from_value(Value::BulkString(b"x".to_vec())),
            Err(EngineError::UnexpectedReply(_))
        ));
    }

    #[test]
    fn test_expire_arg_rejects_out_of_range() {
        assert_eq!(expire_arg("k", 60), Ok(60));
        assert_eq!(
            expire_arg("k", ephemera_traits::MAX_EXPIRE_SECS),
            Ok(ephemera_traits::MAX_EXPIRE_SECS as i64)
        );
        assert!(matches!(
            expire_arg("k", ephemera_traits::MAX_EXPIRE_SECS + 1),
            Err(EngineError::Protocol(_))
        ));
        assert!(expire_arg("k", u64::MAX).is_err());
    }
}
