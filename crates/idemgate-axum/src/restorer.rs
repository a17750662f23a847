use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

use crate::context::IdempotencyKey;

/// Reconstructs a previously sent response for a completed key.
///
/// Every request that observes a `Completed` key is routed here and never to
/// the wrapped handler. Looking up the stored response, re-serializing it,
/// and deciding what to do on a lookup miss are entirely this collaborator's
/// responsibility; the middleware returns whatever it produces.
#[async_trait]
pub trait Restorer: Send + Sync {
    async fn restore(&self, key: &IdempotencyKey, request: Request) -> Response;
}
