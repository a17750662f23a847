use std::time::Duration;

/// Configuration for [`RedisStore`](crate::RedisStore).
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Prefix prepended to every stored key (`"{prefix}:{key}"`) to avoid
    /// collisions in a shared keyspace.
    pub key_prefix: String,

    /// Expiry applied to a record at claim time. Also bounds how long a key
    /// stays stuck `InProcess` if the claiming process dies mid-request.
    pub ttl: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "idemgate".to_string(),
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisStoreConfig::default();
        assert_eq!(config.key_prefix, "idemgate");
        assert_eq!(config.ttl, Duration::from_secs(86_400));
    }
}
