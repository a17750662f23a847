use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::store::{ClaimOutcome, KeyStatus, KeyStore};

/// Single-process key store backed by a map under one exclusive/shared lock.
///
/// Records have no expiry and live until the process exits, so the map grows
/// without bound under a steady stream of fresh keys. The single lock also
/// serializes claims across unrelated keys; sharding the lock by key would
/// remove that false contention. Both are accepted limitations of this
/// backend; use a TTL-capable distributed backend where either matters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: RwLock<HashMap<String, KeyStatus>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Internal("key map lock poisoned".to_string())
}

#[async_trait]
impl KeyStore for MemoryStore {
    #[instrument(skip(self), level = "debug")]
    async fn claim(&self, key: &str) -> Result<ClaimOutcome, StoreError> {
        // Check and insert under one write lock; this is the critical section
        // that makes the claim atomic.
        let mut keys = self.keys.write().map_err(poisoned)?;
        match keys.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let status = *entry.get();
                debug!("claim lost for {} ({})", key, status);
                Ok(match status {
                    KeyStatus::InProcess => ClaimOutcome::AlreadyInProcess,
                    KeyStatus::Completed => ClaimOutcome::AlreadyCompleted,
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(KeyStatus::InProcess);
                debug!("claimed {}", key);
                Ok(ClaimOutcome::Created)
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn query(&self, key: &str) -> Result<Option<KeyStatus>, StoreError> {
        let keys = self.keys.read().map_err(poisoned)?;
        Ok(keys.get(key).copied())
    }

    #[instrument(skip(self), level = "debug")]
    async fn mark_completed(&self, key: &str) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(poisoned)?;
        match keys.get_mut(key) {
            Some(status) => {
                *status = KeyStatus::Completed;
                debug!("completed {}", key);
            }
            // The record is gone (never claimed here, or the process that
            // claimed it restarted). Nothing left to transition.
            None => debug!("no record for {} to complete", key),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;

    #[tokio::test]
    async fn test_claim_lifecycle() {
        let store = MemoryStore::new();

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
    }

    #[tokio::test]
    async fn test_claim_while_in_process() {
        let store = MemoryStore::new();

        assert_eq!(store.claim("key-1").await.unwrap(), ClaimOutcome::Created);
        assert_eq!(
            store.claim("key-1").await.unwrap(),
            ClaimOutcome::AlreadyInProcess
        );
    }

    #[tokio::test]
    async fn test_claim_after_completion() {
        let store = MemoryStore::new();

        store.claim("key-1").await.unwrap();
        store.mark_completed("key-1").await.unwrap();

        assert_eq!(
            store.claim("key-1").await.unwrap(),
            ClaimOutcome::AlreadyCompleted
        );
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_interfere() {
        let store = MemoryStore::new();

        assert_eq!(store.claim("key-a").await.unwrap(), ClaimOutcome::Created);
        assert_eq!(store.claim("key-b").await.unwrap(), ClaimOutcome::Created);

        store.mark_completed("key-a").await.unwrap();
        assert_eq!(
            store.query("key-b").await.unwrap(),
            Some(KeyStatus::InProcess)
        );
    }

    #[tokio::test]
    async fn test_complete_without_claim_is_noop() {
        let store = MemoryStore::new();

        store.mark_completed("key-1").await.unwrap();
        assert_eq!(store.query("key-1").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_have_one_winner() {
        let store = Arc::new(MemoryStore::new());

        let claims = (0..32).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.claim("contested").await.unwrap() })
        });

        let outcomes: Vec<ClaimOutcome> = join_all(claims)
            .await
            .into_iter()
            .map(|res| res.unwrap())
            .collect();

        let created = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::Created)
            .count();
        assert_eq!(created, 1);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, ClaimOutcome::Created | ClaimOutcome::AlreadyInProcess)));
    }
}
