//! TOML settings
//!
//! Every key is optional; a missing file yields the defaults. Relative paths
//! are resolved against `common.data_dir`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::utils::http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_info_log_level() -> String {
    "info".to_string()
}

fn default_local_nodes_file() -> String {
    "nodes.json".to_string()
}

fn default_store_nodes_file() -> String {
    "store_nodes.json".to_string()
}

fn default_subscriptions_file() -> String {
    "subscriptions.json".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Common settings section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_info_log_level")]
    pub log_level: String,
}

impl Default for CommonSettings {
    fn default() -> Self {
        CommonSettings {
            data_dir: default_data_dir(),
            log_level: default_info_log_level(),
        }
    }
}

/// Document locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Working inventory document.
    #[serde(default = "default_local_nodes_file")]
    pub local_nodes_file: String,
    /// JSON export of the authoritative store.
    #[serde(default = "default_store_nodes_file")]
    pub store_nodes_file: String,
    #[serde(default = "default_subscriptions_file")]
    pub subscriptions_file: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            local_nodes_file: default_local_nodes_file(),
            store_nodes_file: default_store_nodes_file(),
            subscriptions_file: default_subscriptions_file(),
            output_dir: default_output_dir(),
        }
    }
}

/// Feed download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_concurrent: default_max_concurrent_fetches(),
        }
    }
}

/// Artifact output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Also write the Base64 variant of the bundle.
    #[serde(default = "default_true")]
    pub bundle_base64: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            bundle_base64: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub common: CommonSettings,
    pub storage: StorageSettings,
    pub fetch: FetchSettings,
    pub output: OutputSettings,
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|source| SettingsError::Toml {
            path: origin.display().to_string(),
            source,
        })
    }

    /// Loads the settings file at `path`, falling back to defaults when it
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("Settings file {} not found, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.common.data_dir).join(path)
        }
    }

    pub fn local_nodes_path(&self) -> PathBuf {
        self.resolve(&self.storage.local_nodes_file)
    }

    pub fn store_nodes_path(&self) -> PathBuf {
        self.resolve(&self.storage.store_nodes_file)
    }

    pub fn subscriptions_path(&self) -> PathBuf {
        self.resolve(&self.storage.subscriptions_file)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.storage.output_dir)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Parallel fetch limit, never below one.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.fetch.max_concurrent.max(1)
    }
}
