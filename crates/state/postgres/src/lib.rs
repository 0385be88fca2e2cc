//! `PostgreSQL` metadata store for burnbin.
//!
//! One table, `{schema}.{prefix}pastes`, holds every paste record. The
//! read counter is decremented in place with a guarded `UPDATE`, and the
//! reaper's group query aggregates by content hash.

mod config;
mod migrations;
mod store;

pub use config::PostgresConfig;
pub use migrations::run_migrations;
pub use store::PostgresMetadataStore;
