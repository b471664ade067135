//! Configuration file support for droidinfo.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (DROIDINFO_*, ANDROID_SERIAL)
//! 3. Local config file (./droidinfo.toml)
//! 4. Global config file (~/.config/droidinfo/config.toml)
//!
//! `--config PATH` replaces both files.

use directories::ProjectDirs;
use droidinfo::bridge::native::DEFAULT_TIMEOUT;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::CliError;

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "droidinfo.toml";

/// `[adb]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdbConfig {
    /// Explicit adb executable.
    pub path: Option<PathBuf>,
    /// Per-command timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Restart the adb server before querying.
    #[serde(default)]
    pub restart_server: bool,
}

/// `[device]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Preferred device serial.
    pub serial: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// adb settings.
    #[serde(default)]
    pub adb: AdbConfig,
    /// Target device settings.
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Command-line values that take precedence over the files.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub adb: Option<&'a Path>,
    pub timeout_secs: Option<u64>,
    pub serial: Option<&'a str>,
    pub restart_server: bool,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit adb executable; `None` searches the usual locations.
    pub adb: Option<PathBuf>,
    /// Per-command timeout.
    pub timeout: Duration,
    /// Requested device serial.
    pub serial: Option<String>,
    /// Restart the adb server first.
    pub restart_server: bool,
}

impl Config {
    /// Load configuration from the global and local files.
    ///
    /// Missing files are skipped; unreadable or invalid ones are reported
    /// with a warning and ignored.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_lenient(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        if let Some(local_config) = Self::load_lenient(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    ///
    /// Unlike the implicit files, an explicit file must exist and parse.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!(
                "Invalid TOML in config file {}: {e}",
                path.display()
            ))
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn load_lenient(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(
                        "Invalid TOML in config file {}, using defaults: {e}",
                        path.display()
                    );
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read config file {}: {e}", path.display());
                None
            },
        }
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "droidinfo").map(|dirs| {
            dirs.config_dir()
                .to_path_buf()
        })
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one.
    fn merge(&mut self, other: Self) {
        if other.adb.path.is_some() {
            self.adb.path = other.adb.path;
        }
        if other.adb.timeout_secs.is_some() {
            self.adb.timeout_secs = other.adb.timeout_secs;
        }
        if other.adb.restart_server {
            self.adb.restart_server = true;
        }
        if other.device.serial.is_some() {
            self.device.serial = other.device.serial;
        }
    }

    /// Combine the files with command-line values.
    pub fn settings(&self, overrides: &Overrides<'_>) -> Settings {
        let timeout_secs = overrides
            .timeout_secs
            .or(self.adb.timeout_secs);
        let timeout = match timeout_secs {
            Some(0) => {
                warn!("Ignoring timeout of 0 seconds, using {DEFAULT_TIMEOUT:?}");
                DEFAULT_TIMEOUT
            },
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Settings {
            adb: overrides
                .adb
                .map(Path::to_path_buf)
                .or_else(|| {
                    self.adb
                        .path
                        .clone()
                }),
            timeout,
            serial: overrides
                .serial
                .map(str::to_string)
                .or_else(|| {
                    self.device
                        .serial
                        .clone()
                }),
            restart_server: overrides.restart_server || self.adb.restart_server,
        }
    }
}
