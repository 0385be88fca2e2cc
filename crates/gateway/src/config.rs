use std::time::Duration;

use burnbin_core::DEFAULT_ID_LENGTH;

use crate::error::GatewayError;

/// Tunables for [`PasteOrchestrator`](crate::PasteOrchestrator).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Length of generated public ids.
    pub id_length: usize,
    /// Lifetime used when a create request does not name one.
    pub default_ttl: Duration,
    /// How long a not-found answer is cached.
    pub negative_ttl: Duration,
    /// How long a read waits for the per-paste lock.
    pub lock_timeout: Duration,
    /// Deadline applied to every store and cache call.
    pub call_timeout: Duration,
    /// Fresh ids tried before giving up on a create.
    pub max_id_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_ID_LENGTH,
            default_ttl: Duration::from_secs(24 * 60 * 60),
            negative_ttl: Duration::from_secs(60 * 60),
            lock_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(5),
            max_id_attempts: 3,
        }
    }
}

impl OrchestratorConfig {
    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.id_length == 0 {
            return Err(GatewayError::Configuration(
                "id_length must be greater than zero".into(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(GatewayError::Configuration(
                "default_ttl must be greater than zero".into(),
            ));
        }
        if self.max_id_attempts == 0 {
            return Err(GatewayError::Configuration(
                "max_id_attempts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
