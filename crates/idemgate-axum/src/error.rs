use axum::http::StatusCode;
use idemgate_core::StoreError;
use thiserror::Error;

/// Errors surfaced to the client by the verification middleware.
///
/// None of these are retried internally; the client retries by resending the
/// identical key and request. A completion failure after the handler ran is
/// deliberately absent here: it cannot alter the already-committed response
/// and is only reported through logging.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no Idempotency-Key set")]
    MissingKey,

    #[error("request already in progress")]
    InProcess,

    #[error("could not process request: {0}")]
    Store(#[from] StoreError),
}

impl VerifyError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            VerifyError::MissingKey => StatusCode::BAD_REQUEST,
            VerifyError::InProcess => StatusCode::CONFLICT,
            VerifyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::MissingKey => "MISSING_IDEMPOTENCY_KEY",
            VerifyError::InProcess => "REQUEST_IN_PROCESS",
            VerifyError::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(VerifyError::MissingKey.status(), StatusCode::BAD_REQUEST);
        assert_eq!(VerifyError::InProcess.status(), StatusCode::CONFLICT);
        assert_eq!(
            VerifyError::Store(StoreError::Io("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
