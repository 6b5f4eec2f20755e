//! Global configuration for Tandem.
//!
//! Loaded from `{data_dir}/config.toml` by the infra layer; every field has
//! a default so a missing or partial file still yields a usable config.

use serde::{Deserialize, Serialize};

/// Transport delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL of the transport delivery API.
    pub api_url: String,
    /// Bearer token for the delivery API. Wrapped in a secret at client
    /// construction; kept plain here so it can live in config.toml.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8081".to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub transport: TransportConfig,
}
