//! Configuration file management.

use std::path::PathBuf;

use hacklab_engine::config::{EngineConfig, TerminalConfig, UnlockConfig};
use serde::{Deserialize, Serialize};

/// Complete lab configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Puzzle catalog source.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Hint unlock timing.
    #[serde(default)]
    pub unlock: UnlockConfig,
    /// Terminal prompt, boot script and pacing.
    #[serde(default)]
    pub terminal: TerminalConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Database file name inside the data directory.
    #[serde(default = "default_database")]
    pub database: String,
    /// Keep progress in memory only. Nothing survives the process.
    #[serde(default)]
    pub in_memory: bool,
}

/// Catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// TOML catalog file. Empty = built-in catalog.
    #[serde(default)]
    pub path: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_database() -> String {
    "hacklab.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            database: default_database(),
            in_memory: false,
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl LabConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: LabConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// The engine's share of the configuration.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            unlock: self.unlock.clone(),
            terminal: self.terminal.clone(),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the database file path.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("HACKLAB_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Hacklab")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("Hacklab")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".hacklab")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/hacklab"))
}
