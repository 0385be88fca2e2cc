//! Redis backends for burnbin.
//!
//! - **Lease lock**: cross-process mutual exclusion using `SET NX PX` with an
//!   owner token, acquired with exponential backoff until a deadline.
//! - **Metadata cache**: JSON-encoded [`CacheEntry`] values; negative markers
//!   carry a `PX` expiry, positive snapshots none.
//! - **Content cache**: raw paste bodies keyed by content hash.
//!
//! Every type shares one `deadpool-redis` pool built by [`connect`], which
//! polls the server with `PING` until it answers or the connect deadline
//! passes.
//!
//! [`CacheEntry`]: burnbin_state::CacheEntry

mod cache;
mod config;
mod keys;
pub mod lock;
mod pool;
mod scripts;

pub use cache::{RedisContentCache, RedisMetadataCache};
pub use config::RedisConfig;
pub use lock::RedisDistributedLock;
pub use pool::{build_pool, connect};
