//! Core contract and types for idemgate key-status stores.
//!
//! An idempotency key is an opaque, client-supplied string identifying one
//! logical request across retries. This crate defines the abstractions shared
//! between backends:
//! - `KeyStore`: atomic claim/query/complete operations over a key space
//! - `MemoryStore`: single-process implementation backed by an exclusive lock
//!
//! A key's status only ever moves `absent -> InProcess -> Completed`; there is
//! no reverse transition. For any key, at most one caller wins the
//! `absent -> InProcess` transition.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{ClaimOutcome, KeyStatus, KeyStore};
