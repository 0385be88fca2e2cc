//! Redis lease lock.
//!
//! A lease is `SET key owner NX PX ttl`; release is a compare-and-delete on
//! the owner token, both as Lua scripts. A holder that crashes frees the key
//! once its lease runs out.
//!
//! Acquisition retries with exponential backoff (doubling from
//! `backoff_min`, capped at `backoff_max`) until the caller's timeout.
//!
//! Mutual exclusion is only as strong as the Redis deployment: with async
//! replication a failover can lose a freshly written lease. The critical
//! section it guards (a single counter decrement plus a cache write) must
//! finish well within the lease TTL.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::{AsyncCommands, Script};
use tracing::debug;

use burnbin_state::error::StateError;
use burnbin_state::lock::{DistributedLock, LockGuard};

use crate::config::RedisConfig;
use crate::keys::lock_key;
use crate::scripts;

/// Redis-backed implementation of [`DistributedLock`].
pub struct RedisDistributedLock {
    pool: Pool,
    prefix: String,
    lease_ttl: Duration,
    backoff_min: Duration,
    backoff_max: Duration,
}

impl RedisDistributedLock {
    /// Create a lock on top of an existing pool.
    pub fn new(pool: Pool, config: &RedisConfig) -> Self {
        Self {
            pool,
            prefix: config.prefix.clone(),
            lease_ttl: config.lease_ttl,
            backoff_min: config.backoff_min,
            backoff_max: config.backoff_max,
        }
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

/// Delay to use after `current`.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

#[async_trait]
impl DistributedLock for RedisDistributedLock {
    async fn try_acquire(&self, name: &str) -> Result<Option<Box<dyn LockGuard>>, StateError> {
        let redis_key = lock_key(&self.prefix, name);
        let owner = uuid::Uuid::new_v4().to_string();
        let ttl_ms = i64::try_from(self.lease_ttl.as_millis()).unwrap_or(i64::MAX);

        let mut conn = self.conn().await?;
        let script = Script::new(scripts::LOCK_ACQUIRE);
        let result: i64 = script
            .key(&redis_key)
            .arg(&owner)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        if result == 1 {
            Ok(Some(Box::new(RedisLockGuard {
                pool: self.pool.clone(),
                name: name.to_owned(),
                redis_key,
                owner,
            })))
        } else {
            Ok(None)
        }
    }

    async fn acquire(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Box<dyn LockGuard>, StateError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut delay = self.backoff_min;

        loop {
            if let Some(guard) = self.try_acquire(name).await? {
                return Ok(guard);
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(StateError::Timeout(timeout));
            }

            let sleep_dur = delay.min(deadline - now);
            debug!(lock = %name, delay = ?sleep_dur, "lease held elsewhere, backing off");
            tokio::time::sleep(sleep_dur).await;
            delay = next_backoff(delay, self.backoff_max);
        }
    }
}

/// A held lease.
///
/// Dropping the guard without calling [`release`](LockGuard::release) is safe;
/// the lease will expire after its TTL.
pub struct RedisLockGuard {
    pool: Pool,
    name: String,
    redis_key: String,
    owner: String,
}

impl RedisLockGuard {
    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

#[async_trait]
impl LockGuard for RedisLockGuard {
    fn name(&self) -> &str {
        &self.name
    }

    async fn release(self: Box<Self>) -> Result<(), StateError> {
        let mut conn = self.conn().await?;

        let script = Script::new(scripts::LOCK_RELEASE);
        let result: i64 = script
            .key(&self.redis_key)
            .arg(&self.owner)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        if result == 1 {
            Ok(())
        } else {
            Err(StateError::LockExpired(format!(
                "lease {} was not held by this owner at release time",
                self.redis_key
            )))
        }
    }

    async fn is_held(&self) -> Result<bool, StateError> {
        let mut conn = self.conn().await?;
        let current_owner: Option<String> = conn
            .get(&self.redis_key)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(current_owner.as_deref() == Some(&self.owner))
    }
}
