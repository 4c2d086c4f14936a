//! Tests against a live Redis server.
//!
//! Ignored by default. Run with:
//!
//! ```text
//! EPHEMERA_TEST_REDIS_HOST=127.0.0.1 cargo test -p ephemera-storage -- --ignored
//! ```

use ephemera_storage::{EngineConfig, NewSecret, Stores};
use serde_json::json;

fn config() -> EngineConfig {
    EngineConfig {
        host: std::env::var("EPHEMERA_TEST_REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: std::env::var("EPHEMERA_TEST_REDIS_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(6379),
        response_timeout_secs: Some(5),
        ..Default::default()
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", ephemera_storage::users::generate_token())
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_live_roundtrip() {
    let stores = Stores::connect(&config()).await.unwrap();
    assert!(stores.is_alive().await);

    let id = unique("secret");
    let ttl = stores
        .secrets
        .create(&NewSecret {
            id: id.clone(),
            secret: "payload".to_string(),
            password: Some("pw".to_string()),
            ttl: Some(json!(30)),
        })
        .await
        .unwrap();
    assert_eq!(ttl, 30);

    let record = stores.secrets.get(&id).await.unwrap().unwrap();
    assert_eq!(record.secret, "payload");
    assert_eq!(record.password.as_deref(), Some("pw"));

    stores.secrets.delete(&id).await.unwrap();
    assert!(stores.secrets.get(&id).await.unwrap().is_none());

    let username = unique("user");
    let first = stores.users.create(&username, "pw").await.unwrap();
    let second = stores.users.create(&username, "pw").await.unwrap();
    assert_ne!(first.basic_auth_token, second.basic_auth_token);
    stores.users.delete(&username).await.unwrap();

    stores.close();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_live_rate_limit() {
    let stores = Stores::connect(&config()).await.unwrap();
    let client = unique("client");

    for _ in 0..100 {
        assert!(!stores.rate_limiter.check(&client).await.unwrap());
    }
    assert!(stores.rate_limiter.check(&client).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_unreachable_server_is_not_alive() {
    let config = EngineConfig {
        port: 1,
        connect_timeout_secs: Some(1),
        ..Default::default()
    };
    assert!(Stores::connect(&config).await.is_err());
}
