//! Configuration management
//!
//! This module handles loading the bkt configuration file. The file is JSON
//! with PascalCase keys; missing fields take their zero value and unknown
//! fields are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::LogSettings;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Logging sections
    pub logs: Logs,

    /// Maximum number of SDK retries per request
    pub s3_retries: u32,

    /// Region of the storage service
    pub s3_region: String,

    /// Bucket receiving the upload
    pub s3_bucket: String,

    /// Bucket receiving the server-side copy
    pub s3_bucket2: String,

    /// Custom endpoint for S3-compatible backends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_endpoint: Option<String>,
}

/// Logging sections of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Logs {
    /// Settings for the process logger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<LogSettings>,
}

impl Config {
    /// Storage view of the configuration
    pub fn storage(&self) -> StorageSettings {
        StorageSettings {
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            retries: self.s3_retries,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.s3_endpoint {
            url::Url::parse(endpoint)?;
        }
        Ok(())
    }
}

/// Connection settings needed to build a storage client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub region: String,
    pub endpoint: Option<String>,
    pub retries: u32,
}

/// Configuration manager handles loading the config file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for the given path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// There is no fallback: a missing, unreadable or malformed file is an error.
    pub fn load(&self) -> Result<Config> {
        let raw = std::fs::read(&self.config_path).map_err(|source| Error::ConfigRead {
            path: self.config_path.clone(),
            source,
        })?;

        let config: Config =
            serde_json::from_slice(&raw).map_err(|source| Error::ConfigParse {
                path: self.config_path.clone(),
                source,
            })?;

        config.validate()?;

        tracing::debug!(path = %self.config_path.display(), "Config file loaded");
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::with_path(DEFAULT_CONFIG_PATH)
    }
}
