//! HTTP handlers and collaborators for the demo server.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use idemgate_axum::{IdempotencyKey, Restorer};
use serde::Serialize;
use tracing::info;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
}

/// GET /health - Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub idempotency_key: String,
}

/// POST /orders - the wrapped handler. Runs at most once per key; the
/// attached key comes from the request context, not from re-parsing headers.
pub async fn create_order(key: IdempotencyKey) -> impl IntoResponse {
    info!(%key, "creating order");

    Json(OrderResponse {
        order_id: format!("order-{}", key),
        idempotency_key: key.to_string(),
    })
}

/// Demo restorer. Response-body persistence is a separate concern, so this
/// replays completed requests as 204 No Content with a marker header; a real
/// deployment would look up the stored response body here.
pub struct ReplayRestorer;

#[async_trait]
impl Restorer for ReplayRestorer {
    async fn restore(&self, key: &IdempotencyKey, _request: Request) -> Response {
        info!(%key, "replaying completed request");

        (
            StatusCode::NO_CONTENT,
            [("idempotent-replayed", "true")],
        )
            .into_response()
    }
}
