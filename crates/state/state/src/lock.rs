use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;

/// A held lock on one key.
///
/// Callers must always attempt [`LockGuard::release`], including on error
/// paths. Backends with a lease let an abandoned guard lapse on its own.
#[async_trait]
pub trait LockGuard: Send + Sync {
    /// Name of the locked key.
    fn name(&self) -> &str;

    /// Explicitly release the lock.
    async fn release(self: Box<Self>) -> Result<(), StateError>;

    /// Check if the lock is still held by this guard.
    async fn is_held(&self) -> Result<bool, StateError>;
}

/// Per-key mutual exclusion.
///
/// Implemented both by a cross-process lease (Redis) and by an in-process
/// reference-counted table. Either may back the paste read path.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Try to acquire the lock once without waiting.
    /// Returns `None` if the lock is already held by another owner.
    async fn try_acquire(&self, name: &str) -> Result<Option<Box<dyn LockGuard>>, StateError>;

    /// Acquire a lock, waiting up to `timeout` for it to become available.
    async fn acquire(&self, name: &str, timeout: Duration)
    -> Result<Box<dyn LockGuard>, StateError>;
}
