use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, StatusCode};
use axum::response::{IntoResponse, Response};

/// Request header carrying the client-supplied key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// A validated, non-empty idempotency key.
///
/// The verification middleware attaches one to the request extensions of
/// every claimed request, so downstream handlers and collaborators can read
/// it without re-parsing headers. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Arc<str>);

impl IdempotencyKey {
    /// Wrap a raw key. The middleware only constructs these from non-empty
    /// header values; no other validation applies, uniqueness is the
    /// client's responsibility.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Retrieve the key attached to a request, if any.
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<KeyExtension>().map(|ext| ext.0.clone())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extension token for the attached key. The type is private to this crate,
/// so unrelated extensions cannot collide with it and callers cannot forge
/// an attachment.
#[derive(Clone)]
pub(crate) struct KeyExtension(pub(crate) IdempotencyKey);

/// Rejection for [`IdempotencyKey`] used as an extractor on a route that is
/// not behind the verification middleware.
#[derive(Debug)]
pub struct KeyNotAttached;

impl IntoResponse for KeyNotAttached {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "idempotency key not attached to request",
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = KeyNotAttached;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&parts.extensions).ok_or(KeyNotAttached)
    }
}
