//! In-memory engine.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ephemera_traits::{
    Batch, Command, EngineError, EngineResult, KvEngine, PING_REPLY, Reply, check_expire_secs,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Process-local engine with Redis-compatible semantics for the commands the
/// stores use.
///
/// Expiry is lazy: an expired key is dropped the next time it is touched.
/// Time comes from `tokio::time`, so tests can pause and advance the clock.
/// A batch holds the keyspace lock from its first command to its last.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    keyspace: Mutex<Keyspace>,
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
enum Value {
    Hash(HashMap<String, String>),
    Integer(i64),
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of `key`; `None` if it is missing or has no TTL.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut keyspace = self.keyspace.lock();
        keyspace
            .live(key, now)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let keyspace = self.keyspace.lock();
        keyspace
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl Keyspace {
    fn purge_expired(&mut self, key: &str, now: Instant) {
        if self.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        self.purge_expired(key, now);
        self.entries.get_mut(key)
    }

    fn live_or_insert(&mut self, key: &str, now: Instant, empty: fn() -> Value) -> &mut Entry {
        self.purge_expired(key, now);
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: empty(),
                expires_at: None,
            })
    }

    fn hset_multiple(&mut self, key: &str, fields: &[(String, String)], now: Instant) -> EngineResult<i64> {
        let entry = self.live_or_insert(key, now, || Value::Hash(HashMap::new()));

        let Value::Hash(hash) = &mut entry.value else {
            return Err(EngineError::WrongType(key.to_string()));
        };

        let mut added = 0;
        for (field, value) in fields {
            if hash.insert(field.clone(), value.clone()).is_none() {
                added += 1;
            }
        }
        Ok(added)
    }

    fn hgetall(&mut self, key: &str, now: Instant) -> EngineResult<HashMap<String, String>> {
        match self.live(key, now) {
            None => Ok(HashMap::new()),
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => Ok(hash.clone()),
            Some(_) => Err(EngineError::WrongType(key.to_string())),
        }
    }

    fn del(&mut self, key: &str, now: Instant) -> bool {
        self.live(key, now).is_some() && self.entries.remove(key).is_some()
    }

    fn expire(&mut self, key: &str, seconds: u64, now: Instant) -> EngineResult<bool> {
        check_expire_secs(key, seconds)?;
        if seconds == 0 {
            return Ok(self.del(key, now));
        }
        let deadline = now
            .checked_add(Duration::from_secs(seconds))
            .ok_or_else(|| EngineError::protocol(format!("invalid expire time {seconds} for key {key}")))?;
        match self.live(key, now) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn incr(&mut self, key: &str, now: Instant) -> EngineResult<i64> {
        let entry = self.live_or_insert(key, now, || Value::Integer(0));

        let Value::Integer(count) = &mut entry.value else {
            return Err(EngineError::WrongType(key.to_string()));
        };

        *count = count
            .checked_add(1)
            .ok_or_else(|| EngineError::protocol("increment would overflow"))?;
        Ok(*count)
    }

    fn apply(&mut self, command: &Command, now: Instant) -> EngineResult<Reply> {
        match command {
            Command::HashSet { key, fields } => self.hset_multiple(key, fields, now).map(Reply::Integer),
            Command::Expire { key, seconds } => self
                .expire(key, *seconds, now)
                .map(|applied| Reply::Integer(applied as i64)),
            Command::Incr { key } => self.incr(key, now).map(Reply::Integer),
            Command::Delete { key } => Ok(Reply::Integer(self.del(key, now) as i64)),
        }
    }
}

#[async_trait]
impl KvEngine for MemoryEngine {
    async fn ping(&self) -> EngineResult<String> {
        Ok(PING_REPLY.to_string())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> EngineResult<()> {
        self.keyspace
            .lock()
            .hset_multiple(key, fields, Instant::now())
            .map(|_| ())
    }

    async fn hgetall(&self, key: &str) -> EngineResult<HashMap<String, String>> {
        self.keyspace.lock().hgetall(key, Instant::now())
    }

    async fn del(&self, key: &str) -> EngineResult<bool> {
        Ok(self.keyspace.lock().del(key, Instant::now()))
    }

    async fn expire(&self, key: &str, seconds: u64) -> EngineResult<bool> {
        self.keyspace.lock().expire(key, seconds, Instant::now())
    }

    async fn incr(&self, key: &str) -> EngineResult<i64> {
        self.keyspace.lock().incr(key, Instant::now())
    }

    async fn exec_atomic(&self, batch: Batch) -> EngineResult<Vec<Reply>> {
        batch.check()?;
        let now = Instant::now();
        let mut keyspace = self.keyspace.lock();
        batch
            .commands()
            .iter()
            .map(|command| keyspace.apply(command, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_hash_roundtrip_and_merge() {
        let engine = MemoryEngine::new();
        engine.hset_multiple("h", &fields(&[("a", "1")])).await.unwrap();
        engine.hset_multiple("h", &fields(&[("b", "2")])).await.unwrap();

        let hash = engine.hgetall("h").await.unwrap();
        assert_eq!(hash.len(), 2);
        assert_eq!(hash["a"], "1");
        assert!(engine.hgetall("missing").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_removes_key_after_deadline() {
        let engine = MemoryEngine::new();
        engine.hset_multiple("h", &fields(&[("a", "1")])).await.unwrap();
        assert!(engine.expire("h", 10).await.unwrap());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!engine.hgetall("h").await.unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(engine.hgetall("h").await.unwrap().is_empty());
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn test_expire_zero_deletes_and_missing_key_reports_false() {
        let engine = MemoryEngine::new();
        assert!(!engine.expire("missing", 10).await.unwrap());

        engine.incr("n").await.unwrap();
        assert!(engine.expire("n", 0).await.unwrap());
        assert_eq!(engine.len(), 0);
    }

    #[tokio::test]
    async fn test_wrong_type_is_rejected() {
        let engine = MemoryEngine::new();
        engine.incr("n").await.unwrap();

        let err = engine.hgetall("n").await.unwrap_err();
        assert_eq!(err, EngineError::WrongType("n".to_string()));
        assert!(engine.hset_multiple("n", &fields(&[("a", "1")])).await.is_err());
    }

    #[tokio::test]
    async fn test_del_reports_existence() {
        let engine = MemoryEngine::new();
        engine.incr("n").await.unwrap();
        assert!(engine.del("n").await.unwrap());
        assert!(!engine.del("n").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_replies_in_order() {
        let engine = MemoryEngine::new();
        let replies = engine
            .exec_atomic(Batch::new().incr("c").incr("c").expire("c", 60))
            .await
            .unwrap();

        assert_eq!(
            replies,
            vec![Reply::Integer(1), Reply::Integer(2), Reply::Integer(1)]
        );
        assert_eq!(engine.ttl("c"), Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_expire_keeps_key_untouched() {
        let engine = MemoryEngine::new();
        engine.hset_multiple("h", &fields(&[("a", "1")])).await.unwrap();
        engine.expire("h", 60).await.unwrap();

        let err = engine.expire("h", u64::MAX).await.unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
        assert_eq!(engine.ttl("h"), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_rejected_batch_applies_nothing() {
        let engine = MemoryEngine::new();
        let batch = Batch::new()
            .hset_multiple("h", fields(&[("a", "1")]))
            .expire("h", ephemera_traits::MAX_EXPIRE_SECS + 1);

        assert!(engine.exec_atomic(batch).await.is_err());
        assert!(engine.is_empty());
    }
}
