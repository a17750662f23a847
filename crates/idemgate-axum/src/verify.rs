use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use idemgate_core::{ClaimOutcome, KeyStatus, KeyStore};
use tracing::{debug, error, warn};

use crate::context::{IdempotencyKey, KeyExtension, IDEMPOTENCY_KEY_HEADER};
use crate::error::VerifyError;
use crate::responder::{ErrorResponder, JsonErrorResponder};
use crate::restorer::Restorer;

/// Coordinator for `Idempotency-Key` verification.
///
/// Holds the key store and the injected collaborators; clones share them.
/// Mount it on the routes that require a key:
///
/// ```rust,ignore
/// let verifier = Verifier::builder(store, restorer).build();
/// router.route_layer(middleware::from_fn_with_state(verifier, verify))
/// ```
///
/// Requests with distinct keys never block one another; the only per-key
/// serialization point is the store's claim operation. The wrapped handler
/// runs on the claiming request's own task, and completion is marked when it
/// returns, whatever its outcome. If that never happens (the process dies
/// mid-handler, or the client disconnects and the request future is dropped)
/// the key stays `InProcess` until the backend's TTL expires; that expiry is
/// the only defense against a permanently stuck key.
#[derive(Clone)]
pub struct Verifier {
    store: Arc<dyn KeyStore>,
    restorer: Arc<dyn Restorer>,
    responder: Arc<dyn ErrorResponder>,
}

impl Verifier {
    /// Start building a verifier. The restorer has no default: replaying a
    /// completed request with nothing is never the right behavior, so the
    /// caller must supply one.
    pub fn builder(store: Arc<dyn KeyStore>, restorer: Arc<dyn Restorer>) -> VerifierBuilder {
        VerifierBuilder {
            store,
            restorer,
            responder: Arc::new(JsonErrorResponder),
        }
    }

    async fn fail(&self, error: VerifyError, request: Request) -> Response {
        let status = error.status();
        let (parts, _) = request.into_parts();
        self.responder.respond(&error, status, &parts).await
    }

    async fn restore(&self, key: &IdempotencyKey, request: Request) -> Response {
        debug!(key = %key, "restoring previously completed request");
        self.restorer.restore(key, request).await
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        let Some(key) = key_from_headers(request.headers()) else {
            return self.fail(VerifyError::MissingKey, request).await;
        };

        let found = match self.store.query(key.as_str()).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %key, "key status query failed: {}", e);
                return self.fail(VerifyError::Store(e), request).await;
            }
        };

        match found {
            Some(KeyStatus::InProcess) => self.fail(VerifyError::InProcess, request).await,
            Some(KeyStatus::Completed) => self.restore(&key, request).await,
            None => match self.store.claim(key.as_str()).await {
                Ok(ClaimOutcome::Created) => self.run_claimed(key, request, next).await,
                // Lost the race between the query snapshot and the claim;
                // same handling as if the query had seen the winner.
                Ok(ClaimOutcome::AlreadyInProcess) => {
                    self.fail(VerifyError::InProcess, request).await
                }
                Ok(ClaimOutcome::AlreadyCompleted) => self.restore(&key, request).await,
                Err(e) => {
                    warn!(key = %key, "key claim failed: {}", e);
                    self.fail(VerifyError::Store(e), request).await
                }
            },
        }
    }

    async fn run_claimed(
        &self,
        key: IdempotencyKey,
        mut request: Request,
        next: Next,
    ) -> Response {
        request.extensions_mut().insert(KeyExtension(key.clone()));

        // Run the handler to completion; its outcome, success or failure,
        // does not change the transition below.
        let response = next.run(request).await;

        // The handler's response is committed at this point and cannot be
        // retracted by a completion failure; report it and return the
        // response unchanged.
        if let Err(e) = self.store.mark_completed(key.as_str()).await {
            error!(key = %key, "failed to mark request completed: {}", e);
        }

        response
    }
}

/// Builder for [`Verifier`]; collaborators are injected here, never pulled
/// from ambient state.
pub struct VerifierBuilder {
    store: Arc<dyn KeyStore>,
    restorer: Arc<dyn Restorer>,
    responder: Arc<dyn ErrorResponder>,
}

impl VerifierBuilder {
    /// Replace the default [`JsonErrorResponder`].
    pub fn error_responder(mut self, responder: Arc<dyn ErrorResponder>) -> Self {
        self.responder = responder;
        self
    }

    pub fn build(self) -> Verifier {
        Verifier {
            store: self.store,
            restorer: self.restorer,
            responder: self.responder,
        }
    }
}

/// Middleware entry point; mount with
/// `axum::middleware::from_fn_with_state(verifier, verify)`.
pub async fn verify(State(verifier): State<Verifier>, request: Request, next: Next) -> Response {
    verifier.handle(request, next).await
}

fn key_from_headers(headers: &HeaderMap) -> Option<IdempotencyKey> {
    let value = headers.get(IDEMPOTENCY_KEY_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(IdempotencyKey::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_key_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("deadbeef"));

        let key = key_from_headers(&headers).unwrap();
        assert_eq!(key.as_str(), "deadbeef");
    }

    #[test]
    fn test_missing_and_blank_headers_yield_no_key() {
        assert!(key_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("   "));
        assert!(key_from_headers(&headers).is_none());
    }
}
