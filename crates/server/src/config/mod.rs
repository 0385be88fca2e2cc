mod backends;
mod logging;
mod paste;
mod server;


pub use backends::*;
pub use logging::*;
pub use paste::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the burnbin server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct BurnbinConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Paste lifetime and orchestration tunables.
    #[serde(default)]
    pub paste: PasteConfig,
    /// Durable metadata store backend.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Durable content store backend.
    #[serde(default)]
    pub content: ContentConfig,
    /// Read-through cache backend for metadata and content.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Per-paste lock backend.
    #[serde(default)]
    pub lock: LockConfig,
    /// Startup connection polling.
    #[serde(default)]
    pub connect: ConnectConfig,
    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BurnbinConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// The returned flag is `false` when defaults were used.
    pub fn load(path: &Path) -> Result<(Self, bool), ServerError> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok((config, true))
    }
}
