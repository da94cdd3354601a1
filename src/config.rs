//! Configuration for the TCP transport
//!
//! Supports JSON, e.g. `{"nodelay": false, "backlog": 128}`. Missing fields
//! take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// TCP tuning applied by a factory and inherited by every conn it produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Disable Nagle's algorithm on dialed and accepted streams
    #[serde(default = "default_true")]
    pub nodelay: bool,

    /// Pending-connection queue length for listeners
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Set SO_REUSEADDR on listeners (ignored on Windows)
    #[serde(default = "default_true")]
    pub reuse_address: bool,
}

impl TcpConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            nodelay: true,
            backlog: default_backlog(),
            reuse_address: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_backlog() -> u32 {
    1024
}
