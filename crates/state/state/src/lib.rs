pub mod cache;
pub mod error;
pub mod lock;
pub mod retry;
pub mod store;
pub mod testing;

pub use cache::{CacheEntry, ContentCache, MetadataCache};
pub use error::StateError;
pub use lock::{DistributedLock, LockGuard};
pub use retry::{ConnectRetry, retry_until};
pub use store::MetadataStore;
