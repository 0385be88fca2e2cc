use std::time::Duration;

/// Configuration for the Redis lock and cache backends.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`).
    pub url: String,

    /// Key prefix applied to every Redis key to avoid collisions.
    pub prefix: String,

    /// Number of connections in the `deadpool-redis` pool.
    pub pool_size: usize,

    /// Timeout for acquiring a pooled connection.
    pub connection_timeout: Duration,

    /// Lifetime of a lock lease. A crashed holder frees the key after this.
    pub lease_ttl: Duration,

    /// First delay between lock acquisition attempts.
    pub backoff_min: Duration,

    /// Upper bound for the delay between lock acquisition attempts.
    pub backoff_max: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            prefix: String::from("burnbin"),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            lease_ttl: Duration::from_secs(5),
            backoff_min: Duration::from_millis(50),
            backoff_max: Duration::from_secs(5),
        }
    }
}
