//! Lorelink CLI configuration management
//!
//! Layered configuration loading: defaults < TOML file < `LORELINK_*`
//! environment variables. Command-line arguments override on top in
//! `main.rs`.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the lorelink CLI application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local account identity
    pub identity: IdentityConfig,

    /// Snapshot storage locations
    pub storage: StorageConfig,

    /// Demo behavior
    pub demo: DemoConfig,
}

/// Identity configuration for the local account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Key under which snapshots are loaded and saved
    pub account_key: String,

    /// Display name announced to peers
    pub display_name: String,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding snapshot files; `.lorelink` by default
    pub data_dir: PathBuf,
}

/// Demo run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Number of joining peers when not given on the command line
    pub peers: usize,
}

// ----------------------------------------------------------------------------
// Defaults
// ----------------------------------------------------------------------------

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            account_key: "local".to_string(),
            display_name: "Storyteller".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".lorelink"),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { peers: 2 }
    }
}

// ----------------------------------------------------------------------------
// Loading
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration with standard layering
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("LORELINK_").split("__"));
        Ok(figment.extract()?)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
