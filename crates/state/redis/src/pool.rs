use deadpool_redis::{Config, Pool, Runtime};

use burnbin_state::error::StateError;
use burnbin_state::retry::{ConnectRetry, retry_until};

use crate::config::RedisConfig;

/// Build a connection pool without touching the network.
///
/// # Errors
///
/// Returns [`StateError::Connection`] if the pool cannot be created.
pub fn build_pool(config: &RedisConfig) -> Result<Pool, StateError> {
    let cfg = Config::from_url(&config.url);
    cfg.builder()
        .map(|b| {
            b.max_size(config.pool_size)
                .wait_timeout(Some(config.connection_timeout))
                .runtime(Runtime::Tokio1)
                .build()
        })
        .map_err(|e| StateError::Connection(e.to_string()))?
        .map_err(|e| StateError::Connection(e.to_string()))
}

/// Build a pool and wait until the server answers `PING`.
///
/// # Errors
///
/// Returns [`StateError::Timeout`] if Redis is not reachable within the
/// connect deadline.
pub async fn connect(config: &RedisConfig, retry: ConnectRetry) -> Result<Pool, StateError> {
    let pool = build_pool(config)?;
    retry_until("redis", retry, || async {
        let mut conn = pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    })
    .await?;
    Ok(pool)
}
