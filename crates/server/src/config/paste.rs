use std::time::Duration;

use burnbin_gateway::OrchestratorConfig;
use serde::Deserialize;

/// Paste lifetime limits and orchestrator tunables.
#[derive(Debug, Deserialize)]
pub struct PasteConfig {
    /// Length of generated public ids.
    #[serde(default = "default_id_length")]
    pub id_length: usize,
    /// Lifetime applied when an upload does not specify one.
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// Longest lifetime an upload may request.
    #[serde(default = "default_max_ttl")]
    pub max_ttl_seconds: u64,
    /// How long a not-found answer is cached.
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_seconds: u64,
    /// How long a read waits for the per-paste lock.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Deadline for each store and cache call.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
    /// Fresh ids tried when a generated id is already taken.
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            id_length: default_id_length(),
            default_ttl_seconds: default_ttl(),
            max_ttl_seconds: default_max_ttl(),
            negative_ttl_seconds: default_negative_ttl(),
            lock_timeout_ms: default_lock_timeout(),
            call_timeout_ms: default_call_timeout(),
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

impl PasteConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            id_length: self.id_length,
            default_ttl: Duration::from_secs(self.default_ttl_seconds),
            negative_ttl: Duration::from_secs(self.negative_ttl_seconds),
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            max_id_attempts: self.max_id_attempts,
        }
    }

    pub fn max_ttl(&self) -> Duration {
        Duration::from_secs(self.max_ttl_seconds)
    }
}

fn default_id_length() -> usize {
    burnbin_core::DEFAULT_ID_LENGTH
}

fn default_ttl() -> u64 {
    24 * 60 * 60
}

fn default_max_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_negative_ttl() -> u64 {
    60 * 60
}

fn default_lock_timeout() -> u64 {
    5000
}

fn default_call_timeout() -> u64 {
    5000
}

fn default_max_id_attempts() -> u32 {
    3
}
