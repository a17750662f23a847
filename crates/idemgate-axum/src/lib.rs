//! `Idempotency-Key` verification middleware for axum.
//!
//! Implements the Idempotency-Key HTTP header described in
//! draft-ietf-httpapi-idempotency-key-header: the client sends a unique key
//! (UUIDs recommended) with each logical request and retries with the same
//! key; the middleware guarantees the wrapped handler executes at most once
//! per key.
//!
//! Per request:
//! - no key -> 400 Bad Request
//! - key in process -> 409 Conflict
//! - key completed -> the injected [`Restorer`] replays the prior response
//! - fresh key -> the key is claimed, the handler runs, the key is marked
//!   completed
//!
//! ```rust,ignore
//! let store = Arc::new(MemoryStore::new());
//! let verifier = Verifier::builder(store, Arc::new(MyRestorer)).build();
//!
//! let app = Router::new()
//!     .route("/orders", post(create_order))
//!     .route_layer(middleware::from_fn_with_state(verifier, verify));
//! ```

mod context;
mod error;
mod responder;
mod restorer;
mod verify;

pub use context::{IdempotencyKey, KeyNotAttached, IDEMPOTENCY_KEY_HEADER};
pub use error::VerifyError;
pub use responder::{ErrorResponder, JsonErrorResponder};
pub use restorer::Restorer;
pub use verify::{verify, Verifier, VerifierBuilder};
