use burnbin_gateway::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Query parameters of `POST /api/pastes`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePasteParams {
    /// Lifetime in seconds. The configured default applies when omitted.
    pub ttl_seconds: Option<u64>,
    /// Number of reads before the paste burns. `0` or omitted means unlimited.
    #[serde(default)]
    pub burn_after: u32,
}

/// Response body of a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePasteResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub metrics: MetricsSnapshot,
}
