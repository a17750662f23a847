use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::VerifyError;

/// Writes the client-facing response for a verification error.
#[async_trait]
pub trait ErrorResponder: Send + Sync {
    async fn respond(
        &self,
        error: &VerifyError,
        status: StatusCode,
        request: &Parts,
    ) -> Response;
}

/// Default responder: a JSON body carrying the error text and a stable code.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonErrorResponder;

#[async_trait]
impl ErrorResponder for JsonErrorResponder {
    async fn respond(
        &self,
        error: &VerifyError,
        status: StatusCode,
        _request: &Parts,
    ) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let body = ErrorBody {
            error: error.to_string(),
            code: error.code(),
        };

        (status, Json(body)).into_response()
    }
}
