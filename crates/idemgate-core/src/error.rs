use thiserror::Error;

/// Errors that can occur in the key-status store layer.
///
/// A lost claim race is not an error; it is reported through
/// [`ClaimOutcome`](crate::ClaimOutcome). Backend failures must never be
/// folded into claim outcomes.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("internal error: {0}")]
    Internal(String),
}
