use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as HoldMutex, OwnedMutexGuard};
use tracing::warn;

use burnbin_state::error::StateError;
use burnbin_state::lock::{DistributedLock, LockGuard};

/// One key in the lock table.
#[derive(Debug)]
struct Slot {
    hold: Arc<HoldMutex<()>>,
    /// Holders plus waiters currently referencing this slot.
    refs: usize,
}

type Table = Arc<Mutex<HashMap<String, Slot>>>;

/// In-process keyed lock table with reference-counted entries.
///
/// The table mutex guards structural changes only. Each slot has its own
/// async mutex for the hold itself, and a slot is evicted only when its
/// reference count drops to zero under the table mutex, so a caller
/// about to wait on a slot can never see it removed underneath it.
#[derive(Debug, Clone, Default)]
pub struct MemoryDistributedLock {
    table: Table,
}

impl MemoryDistributedLock {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.table.lock().len()
    }

    fn checkout(&self, name: &str) -> (Arc<HoldMutex<()>>, Ticket) {
        let mut table = self.table.lock();
        let slot = table.entry(name.to_owned()).or_insert_with(|| Slot {
            hold: Arc::new(HoldMutex::new(())),
            refs: 0,
        });
        slot.refs += 1;
        let ticket = Ticket {
            table: Arc::clone(&self.table),
            name: name.to_owned(),
            armed: true,
        };
        (Arc::clone(&slot.hold), ticket)
    }
}

/// Drop one reference to `name`, evicting the slot at zero.
///
/// `permit` is released while the table mutex is held so that eviction and
/// hand-off cannot interleave with a concurrent checkout.
fn checkin(
    table: &Table,
    name: &str,
    permit: Option<OwnedMutexGuard<()>>,
) -> Result<(), StateError> {
    let mut table = table.lock();
    let Some(slot) = table.get_mut(name) else {
        return Err(StateError::LockNotHeld(name.to_owned()));
    };
    drop(permit);
    slot.refs = slot.refs.saturating_sub(1);
    if slot.refs == 0 {
        table.remove(name);
    }
    Ok(())
}

/// One counted reference to a slot.
///
/// Returned on every exit path: explicitly through [`Ticket::redeem`], or on
/// drop when an acquiring future is cancelled mid-wait.
#[derive(Debug)]
struct Ticket {
    table: Table,
    name: String,
    armed: bool,
}

impl Ticket {
    fn redeem(mut self, permit: Option<OwnedMutexGuard<()>>) -> Result<(), StateError> {
        self.armed = false;
        checkin(&self.table, &self.name, permit)
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = checkin(&self.table, &self.name, None)
        {
            warn!(lock = %self.name, error = %e, "failed to return lock reference");
        }
    }
}

#[async_trait]
impl DistributedLock for MemoryDistributedLock {
    async fn try_acquire(&self, name: &str) -> Result<Option<Box<dyn LockGuard>>, StateError> {
        let (hold, ticket) = self.checkout(name);
        if let Ok(permit) = hold.try_lock_owned() {
            Ok(Some(MemoryLockGuard::boxed(ticket, permit)))
        } else {
            ticket.redeem(None)?;
            Ok(None)
        }
    }

    async fn acquire(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Box<dyn LockGuard>, StateError> {
        let (hold, ticket) = self.checkout(name);
        if let Ok(permit) = tokio::time::timeout(timeout, hold.lock_owned()).await {
            Ok(MemoryLockGuard::boxed(ticket, permit))
        } else {
            ticket.redeem(None)?;
            Err(StateError::Timeout(timeout))
        }
    }
}

/// Guard for a key held in a [`MemoryDistributedLock`].
///
/// Dropping the guard without calling `release` still frees the key.
#[derive(Debug)]
pub struct MemoryLockGuard {
    name: String,
    ticket: Option<Ticket>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl MemoryLockGuard {
    fn boxed(ticket: Ticket, permit: OwnedMutexGuard<()>) -> Box<dyn LockGuard> {
        Box::new(Self {
            name: ticket.name.clone(),
            ticket: Some(ticket),
            permit: Some(permit),
        })
    }

    fn free(&mut self) -> Result<(), StateError> {
        let permit = self.permit.take();
        match self.ticket.take() {
            Some(ticket) => ticket.redeem(permit),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LockGuard for MemoryLockGuard {
    fn name(&self) -> &str {
        &self.name
    }

    async fn release(mut self: Box<Self>) -> Result<(), StateError> {
        self.free()
    }

    async fn is_held(&self) -> Result<bool, StateError> {
        Ok(self.permit.is_some())
    }
}

impl Drop for MemoryLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.free() {
            warn!(lock = %self.name, error = %e, "failed to free dropped lock guard");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use burnbin_state::testing::run_lock_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let lock = MemoryDistributedLock::new();
        run_lock_conformance_tests(&lock)
            .await
            .expect("lock conformance tests should pass");
        assert_eq!(lock.active_keys(), 0, "table should be empty afterwards");
    }

    #[tokio::test]
    async fn release_evicts_entry() {
        let lock = MemoryDistributedLock::new();
        let guard = lock.try_acquire("evict").await.unwrap().unwrap();
        assert_eq!(lock.active_keys(), 1);
        guard.release().await.unwrap();
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn release_of_unknown_key_is_an_error() {
        let lock = MemoryDistributedLock::new();
        let err = checkin(&lock.table, "ghost", None).unwrap_err();
        assert!(matches!(err, StateError::LockNotHeld(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn release_after_external_eviction_is_an_error() {
        let lock = MemoryDistributedLock::new();
        let guard = lock.try_acquire("stolen").await.unwrap().unwrap();
        lock.table.lock().clear();
        let err = guard.release().await.unwrap_err();
        assert!(matches!(err, StateError::LockNotHeld(_)));
    }

    #[tokio::test]
    async fn dropped_guard_frees_key() {
        let lock = MemoryDistributedLock::new();
        {
            let _guard = lock.try_acquire("dropped").await.unwrap().unwrap();
            assert!(lock.try_acquire("dropped").await.unwrap().is_none());
        }
        assert_eq!(lock.active_keys(), 0);
        assert!(lock.try_acquire("dropped").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_keeps_entry_alive() {
        let lock = MemoryDistributedLock::new();
        let guard = lock.try_acquire("shared").await.unwrap().unwrap();

        let waiter_lock = lock.clone();
        let waiter = tokio::spawn(async move {
            waiter_lock
                .acquire("shared", Duration::from_secs(10))
                .await
                .map(|g| g.name().to_owned())
        });
        for _ in 0..100 {
            if lock.table.lock().get("shared").map(|s| s.refs) == Some(2) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(lock.table.lock().get("shared").map(|s| s.refs), Some(2));

        guard.release().await.unwrap();
        // The waiter still references the slot, so it must survive.
        let name = waiter.await.unwrap().unwrap();
        assert_eq!(name, "shared");
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_timeout_drops_reference() {
        let lock = MemoryDistributedLock::new();
        let guard = lock.try_acquire("busy").await.unwrap().unwrap();

        let result = lock.acquire("busy", Duration::from_secs(1)).await;
        assert!(
            matches!(result, Err(StateError::Timeout(_))),
            "should time out when lock is held"
        );
        assert_eq!(lock.table.lock().get("busy").map(|s| s.refs), Some(1));

        guard.release().await.unwrap();
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiter_returns_reference() {
        let lock = MemoryDistributedLock::new();
        let guard = lock.try_acquire("k").await.unwrap().unwrap();

        let waiter_lock = lock.clone();
        let waiter = tokio::spawn(async move {
            let _ = waiter_lock.acquire("k", Duration::from_secs(60)).await;
        });
        for _ in 0..100 {
            if lock.table.lock().get("k").map(|s| s.refs) == Some(2) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(lock.table.lock().get("k").map(|s| s.refs), Some(2));

        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        assert_eq!(lock.table.lock().get("k").map(|s| s.refs), Some(1));

        guard.release().await.unwrap();
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn critical_sections_never_overlap() {
        let lock = Arc::new(MemoryDistributedLock::new());
        let inside = Arc::new(AtomicU32::new(0));
        let completed = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let completed = Arc::clone(&completed);
            handles.push(tokio::spawn(async move {
                let guard = lock
                    .acquire("contention", Duration::from_secs(5))
                    .await
                    .expect("should eventually acquire");
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
                completed.fetch_add(1, Ordering::SeqCst);
                guard.release().await.expect("release should succeed");
            }));
        }

        for h in handles {
            h.await.expect("task should not panic");
        }

        assert_eq!(completed.load(Ordering::SeqCst), 16);
        assert_eq!(lock.active_keys(), 0);
    }
}
