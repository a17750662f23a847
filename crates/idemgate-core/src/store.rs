use std::fmt;

use async_trait::async_trait;

use crate::error::StoreError;

/// Status of an idempotency key record.
///
/// Binary on purpose: there are no intermediate states between "a request
/// holding this key is executing" and "that request finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// A request bearing this key is currently executing.
    InProcess,
    /// The request that claimed this key has finished (success or failure).
    Completed,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::InProcess => f.write_str("in-process"),
            KeyStatus::Completed => f.write_str("completed"),
        }
    }
}

/// Result of a claim attempt.
///
/// Losing the race is a normal outcome, distinct from [`StoreError`]: among N
/// simultaneous claimants of a fresh key, exactly one sees `Created` and the
/// rest see the status the winner left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The key was absent; this caller now owns the `InProcess` record.
    Created,
    /// Another request claimed the key and is still executing.
    AlreadyInProcess,
    /// Another request claimed the key and has completed.
    AlreadyCompleted,
}

/// Store abstraction for idempotency key records.
///
/// Implementations own the atomicity of `claim`: the `absent -> InProcess`
/// transition must be a single indivisible operation from the caller's
/// perspective, never an observable check-then-set.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Atomically transition `key` from absent to `InProcess`.
    async fn claim(&self, key: &str) -> Result<ClaimOutcome, StoreError>;

    /// Read-only snapshot of a key's status. `None` means never seen
    /// (or expired, for TTL-capable backends).
    async fn query(&self, key: &str) -> Result<Option<KeyStatus>, StoreError>;

    /// Transition `key` from `InProcess` to `Completed`, preserving any
    /// existing expiry so completed records still age out.
    async fn mark_completed(&self, key: &str) -> Result<(), StoreError>;
}
