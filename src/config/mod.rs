//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Server configuration
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Largest request body read by the dispatcher, in bytes
    pub max_body_bytes: usize,

    /// Java package of generated client code
    pub java_package: String,

    /// Script URLs added to the head of every HTML page
    pub head_scripts: Vec<String>,

    /// CSS replacing the built-in page style
    pub stylesheet: Option<String>,

    /// Attach a permissive CORS layer
    pub cors: bool,

    /// Default `tracing` filter for binaries embedding the server
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
            java_package: "api".to_string(),
            head_scripts: Vec::new(),
            stylesheet: None,
            cors: true,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
