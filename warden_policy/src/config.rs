//! Authorization configuration.

use serde::Deserialize;
use warden_core::{Error, Result};

/// Operational configuration for the policy system.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Master switch for privilege enforcement. When off, every privilege
    /// check passes; the absent-policy guard still applies. Default on.
    pub enabled: bool,

    /// Chunk size for bulk policy saves during cascades.
    pub save_chunk_size: usize,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            save_chunk_size: 100,
        }
    }
}

impl AuthorizationConfig {
    /// Parse configuration from a TOML document; missing keys fall back to
    /// defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))
    }
}
