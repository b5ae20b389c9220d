//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::ScopeMode;

/// Name of the configuration file at the board root
pub const CONFIG_FILE: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ordering configuration
    #[serde(default)]
    pub ordering: OrderingConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// How task positions are scoped and respaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// `status` groups positions per (milestone, status); `milestone` per milestone
    #[serde(default)]
    pub scope: ScopeMode,

    /// Spacing between positions after a renumber
    #[serde(default = "default_renumber_step")]
    pub renumber_step: u64,
}

fn default_renumber_step() -> u64 {
    1000
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            scope: ScopeMode::default(),
            renumber_step: default_renumber_step(),
        }
    }
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the board state, relative to the board root
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// How long a writer waits for the board lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_storage_dir() -> String {
    ".taskboard".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the board root, or return defaults
    pub fn load_from_dir(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), %err, "ignoring invalid config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute path of the state directory for a board root
    pub fn storage_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.dir)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.ordering.renumber_step < 2
            || self.ordering.renumber_step > crate::position::MAX_RENUMBER_STEP
        {
            return Err(crate::error::Error::InvalidConfig(format!(
                "ordering.renumber_step must be between 2 and {}",
                crate::position::MAX_RENUMBER_STEP
            )));
        }
        if self.storage.dir.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "storage.dir cannot be empty".to_string(),
            ));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
