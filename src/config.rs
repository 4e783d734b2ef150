//! Configuration for sys-cpu
//!
//! Holds the defaults applied to management queries: which namespace to open
//! and which host to address when the caller names none.

use crate::error::{CpuError, Result};
use crate::target::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// sys-cpu configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Management-instrumentation options
    #[serde(default)]
    pub management: ManagementConfig,
}

/// Management-instrumentation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// Namespace holding `Win32_Processor`
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Host queried when a call names none (`None` = local host name)
    #[serde(default)]
    pub default_host: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            default_host: None,
        }
    }
}

impl Config {
    /// Get the default configuration directory
    ///
    /// Returns `~/.config/sys-cpu` on Unix-like systems,
    /// or `%APPDATA%\sys-cpu` on Windows.
    pub fn default_path() -> PathBuf {
        let config_dir = if cfg!(windows) {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from(".config"))
        };

        config_dir.join("sys-cpu")
    }

    /// Load configuration from the default path, or defaults if no file exists
    pub fn load() -> Result<Self> {
        let config_file = Self::default_path().join("config.toml");

        if !config_file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| CpuError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::default_path();
        std::fs::create_dir_all(&config_dir)?;
        self.save_to(&config_dir.join("config.toml"))
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CpuError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
