use clap::Parser;

/// Configuration for the idemgate demo server.
#[derive(Parser, Debug, Clone)]
#[command(name = "idemgate-server")]
#[command(about = "Demo HTTP server fronting handlers with Idempotency-Key verification")]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "IDEMGATE_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value = "8080", env = "IDEMGATE_PORT")]
    pub port: u16,

    /// Redis connection URL; falls back to the in-memory store when unset
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Prefix for stored idempotency keys (Redis store only)
    #[arg(long, default_value = "idemgate", env = "IDEMGATE_KEY_PREFIX")]
    pub key_prefix: String,

    /// Expiry for stored idempotency keys in seconds (Redis store only)
    #[arg(long, default_value = "86400", env = "IDEMGATE_KEY_TTL_SECS")]
    pub key_ttl_secs: u64,
}
