//! Integration tests against a live Redis server.
//!
//! Ignored by default so the suite stays hermetic. Run them with a server
//! available:
//!
//! ```text
//! REDIS_URL=redis://127.0.0.1/ cargo test -p idemgate-redis -- --ignored
//! ```

use std::time::Duration;

use idemgate_core::{ClaimOutcome, KeyStatus, KeyStore};
use idemgate_redis::{RedisStore, RedisStoreConfig};

async fn store(test_name: &str) -> RedisStore {
    let url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let config = RedisStoreConfig {
        // Per-test, per-run prefix so reruns never see stale records.
        key_prefix: format!("idemgate-test:{}:{}", test_name, std::process::id()),
        ttl: Duration::from_secs(60),
    };
    RedisStore::connect(&url, config).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn test_claim_lifecycle() {
    let store = store("lifecycle").await;

    assert_eq!(store.query("key-1").await.unwrap(), None);
    assert_eq!(store.claim("key-1").await.unwrap(), ClaimOutcome::Created);
    assert_eq!(
        store.query("key-1").await.unwrap(),
        Some(KeyStatus::InProcess)
    );

    store.mark_completed("key-1").await.unwrap();
    assert_eq!(
        store.query("key-1").await.unwrap(),
        Some(KeyStatus::Completed)
    );
    assert_eq!(
        store.claim("key-1").await.unwrap(),
        ClaimOutcome::AlreadyCompleted
    );
}

#[tokio::test]
#[ignore]
async fn test_claim_race_is_not_an_error() {
    let store = store("race").await;

    assert_eq!(store.claim("key-1").await.unwrap(), ClaimOutcome::Created);
    // A second claimant loses the race but gets a status, not an Err.
    assert_eq!(
        store.claim("key-1").await.unwrap(),
        ClaimOutcome::AlreadyInProcess
    );
}

#[tokio::test]
#[ignore]
async fn test_completion_preserves_expiry() {
    let store = store("keepttl").await;

    store.claim("key-1").await.unwrap();
    store.mark_completed("key-1").await.unwrap();

    // The record must still carry the claim-time expiry rather than having
    // been rewritten as persistent.
    let url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let client = redis::Client::open(url.as_str()).unwrap();
    let mut conn = client.get_connection_manager().await.unwrap();
    let ttl: i64 = redis::cmd("TTL")
        .arg(format!(
            "idemgate-test:keepttl:{}:key-1",
            std::process::id()
        ))
        .query_async(&mut conn)
        .await
        .unwrap();
    assert!(ttl > 0 && ttl <= 60);
}
