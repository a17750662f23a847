use async_trait::async_trait;
use idemgate_core::{ClaimOutcome, KeyStatus, KeyStore, StoreError};
use redis::aio::ConnectionManager;
use tracing::{debug, instrument};

use crate::config::RedisStoreConfig;

/// Value token stored while the claiming request is executing.
const TOKEN_IN_PROCESS: &str = "in-process";
/// Value token stored once the claiming request has finished.
const TOKEN_DONE: &str = "done";

/// Map a stored value token back to a status.
///
/// Anything other than the two known tokens means the keyspace is shared with
/// a writer we don't know about; surface that instead of guessing.
fn status_for_token(token: &str) -> Result<KeyStatus, StoreError> {
    match token {
        TOKEN_IN_PROCESS => Ok(KeyStatus::InProcess),
        TOKEN_DONE => Ok(KeyStatus::Completed),
        other => Err(StoreError::Corrupt(format!(
            "unexpected value token {other:?}"
        ))),
    }
}

/// Namespace a client-supplied key into the shared keyspace.
fn namespaced(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

/// Distributed key store on top of Redis.
///
/// All operations are plain futures: dropping the caller's future cancels the
/// in-flight network call, which is how a request's cancellation or timeout
/// reaches the backend.
///
/// Known gap: once a `Completed` record expires, a retry of that request is
/// indistinguishable from a brand-new request and will re-execute the wrapped
/// handler. Size the TTL to the longest client retry window you support.
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisStore {
    /// Connect to `url` and build a store with the given configuration.
    pub async fn connect(url: &str, config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Io(format!("invalid Redis URL: {}", e)))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Io(format!("Redis connection failed: {}", e)))?;
        Ok(Self::with_connection(conn, config))
    }

    /// Build a store from an existing connection manager.
    pub fn with_connection(conn: ConnectionManager, config: RedisStoreConfig) -> Self {
        Self { conn, config }
    }

    fn storage_key(&self, key: &str) -> String {
        namespaced(&self.config.key_prefix, key)
    }

    fn ttl_secs(&self) -> u64 {
        // Redis rejects a zero expiry.
        self.config.ttl.as_secs().max(1)
    }
}

#[async_trait]
impl KeyStore for RedisStore {
    #[instrument(skip(self), level = "debug")]
    async fn claim(&self, key: &str) -> Result<ClaimOutcome, StoreError> {
        let storage_key = self.storage_key(key);
        let mut conn = self.conn.clone();

        loop {
            // SET NX is the atomic set-if-absent; the server decides the
            // winner among concurrent claimants.
            let created: Option<String> = redis::cmd("SET")
                .arg(&storage_key)
                .arg(TOKEN_IN_PROCESS)
                .arg("NX")
                .arg("EX")
                .arg(self.ttl_secs())
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Io(format!("SET NX failed: {}", e)))?;

            if created.is_some() {
                debug!("claimed {} (ttl {}s)", storage_key, self.ttl_secs());
                return Ok(ClaimOutcome::Created);
            }

            let token: Option<String> = redis::cmd("GET")
                .arg(&storage_key)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Io(format!("GET failed: {}", e)))?;

            match token {
                Some(token) => {
                    let status = status_for_token(&token)?;
                    debug!("claim lost for {} ({})", storage_key, status);
                    return Ok(match status {
                        KeyStatus::InProcess => ClaimOutcome::AlreadyInProcess,
                        KeyStatus::Completed => ClaimOutcome::AlreadyCompleted,
                    });
                }
                // The record expired between SET and GET; claim again.
                None => continue,
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn query(&self, key: &str) -> Result<Option<KeyStatus>, StoreError> {
        let storage_key = self.storage_key(key);
        let mut conn = self.conn.clone();

        let token: Option<String> = redis::cmd("GET")
            .arg(&storage_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Io(format!("GET failed: {}", e)))?;

        token.map(|t| status_for_token(&t)).transpose()
    }

    #[instrument(skip(self), level = "debug")]
    async fn mark_completed(&self, key: &str) -> Result<(), StoreError> {
        let storage_key = self.storage_key(key);
        let mut conn = self.conn.clone();

        // XX: only overwrite an existing record. KEEPTTL: keep the expiry set
        // at claim time instead of restarting it, so completed records age
        // out on the original schedule.
        let updated: Option<String> = redis::cmd("SET")
            .arg(&storage_key)
            .arg(TOKEN_DONE)
            .arg("XX")
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Io(format!("SET XX failed: {}", e)))?;

        match updated {
            Some(_) => debug!("completed {}", storage_key),
            // The record's lifetime already ended; nothing to transition.
            None => debug!("record for {} expired before completion", storage_key),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        assert_eq!(
            status_for_token(TOKEN_IN_PROCESS).unwrap(),
            KeyStatus::InProcess
        );
        assert_eq!(status_for_token(TOKEN_DONE).unwrap(), KeyStatus::Completed);
    }

    #[test]
    fn test_unknown_token_is_corrupt() {
        let err = status_for_token("pending").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_namespaced_key() {
        assert_eq!(namespaced("idemgate", "deadbeef"), "idemgate:deadbeef");
        assert_eq!(namespaced("orders", "a:b"), "orders:a:b");
    }
}
