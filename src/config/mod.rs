pub mod runtime;
pub use runtime::{apply_env_overrides, config_path_from_env};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Complete teleinfo-sync configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Event channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Channel carrying instant power patches
    #[serde(default = "default_power_channel")]
    pub power_channel: String,
    /// Channel carrying daily consumption patches
    #[serde(default = "default_consumption_channel")]
    pub consumption_channel: String,
    /// Pending messages buffered ahead of the dispatch pump
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_power_channel() -> String {
    "teleinfo.power.update".to_string()
}

fn default_consumption_channel() -> String {
    "teleinfo.consumption.update".to_string()
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            power_channel: default_power_channel(),
            consumption_channel: default_consumption_channel(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Registry population configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    /// JSON dump of the session device fetch; empty registry when unset
    #[serde(default)]
    pub devices_file: Option<String>,
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<SyncConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path))?;
    let config: SyncConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file '{}'", path))?;
    Ok(config)
}
