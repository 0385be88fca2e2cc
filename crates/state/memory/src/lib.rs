mod cache;
mod content;
mod lock;
mod store;

pub use cache::{MemoryContentCache, MemoryMetadataCache};
pub use content::MemoryContentStore;
pub use lock::{MemoryDistributedLock, MemoryLockGuard};
pub use store::MemoryMetadataStore;
