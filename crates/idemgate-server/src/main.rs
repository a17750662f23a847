//! Demo HTTP server for idemgate.
//!
//! Wires the Idempotency-Key verification middleware onto a sample route,
//! backed by Redis when `REDIS_URL` is configured and by the in-memory store
//! otherwise.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use idemgate_axum::{verify, Verifier};
use idemgate_core::{KeyStore, MemoryStore};
use idemgate_redis::{RedisStore, RedisStoreConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;

use config::Config;
use handlers::{create_order, health_handler, ReplayRestorer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting idemgate-server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);

    let store: Arc<dyn KeyStore> = match &config.redis_url {
        Some(url) => {
            info!("  Store: redis");
            info!("  Key prefix: {}", config.key_prefix);
            info!("  Key TTL: {}s", config.key_ttl_secs);

            let store_config = RedisStoreConfig {
                key_prefix: config.key_prefix.clone(),
                ttl: Duration::from_secs(config.key_ttl_secs),
            };
            Arc::new(RedisStore::connect(url, store_config).await?)
        }
        None => {
            warn!("  Store: in-memory (single process, records never expire)");
            warn!("  Set REDIS_URL to share keys across processes");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = Verifier::builder(store, Arc::new(ReplayRestorer)).build();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let idempotent_routes = Router::new()
        .route("/orders", post(create_order))
        .route_layer(middleware::from_fn_with_state(verifier, verify));

    let app = Router::new()
        .route("/health", get(health_handler))
        .merge(idempotent_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
