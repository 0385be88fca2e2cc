//! Paste orchestration for burnbin.
//!
//! [`PasteOrchestrator`] composes a metadata store, a content store, two
//! caches and a per-id lock into the Create and Read operations. The
//! [`Reaper`] reclaims blobs once every paste referencing them is
//! unreadable.

pub mod builder;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod reaper;

pub use builder::OrchestratorBuilder;
pub use config::OrchestratorConfig;
pub use error::{GatewayError, NotFoundReason};
pub use metrics::{MetricsSnapshot, PasteMetrics};
pub use orchestrator::PasteOrchestrator;
pub use reaper::{ReapReport, Reaper};
