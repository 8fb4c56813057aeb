//! # Configuration Persistence
//!
//! Manages user configuration stored in `~/.config/webboot/config.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is serialized to / deserialized from a JSON file in
//! the user's XDG config directory. Every field has a default, so a partial
//! file (or none at all) is fine.
//!
//! ```json
//! {
//!   "endpoint": "ws://localhost:8080",
//!   "theme": "Nord",
//!   "filesystem": "exFAT",
//!   "scheme": "GPT",
//!   "verify_timeout_secs": 10
//! }
//! ```
//!
//! The `directories` crate is used to resolve the platform-appropriate config
//! directory.

use crate::session::{Filesystem, JobForm, PartitionScheme};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Well-known local endpoint of the WebBoot Companion.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080";

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// WebSocket URL of the companion.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// The name of the selected theme (must match a built-in theme name).
    #[serde(default = "default_theme_name")]
    pub theme: String,

    /// Filesystem preselected in the job form.
    #[serde(default)]
    pub filesystem: Filesystem,

    /// Partition scheme preselected in the job form.
    #[serde(default)]
    pub scheme: PartitionScheme,

    /// Upper bound for a single device verification.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_theme_name() -> String {
    "Catppuccin Mocha".to_string()
}

fn default_verify_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            theme: default_theme_name(),
            filesystem: Filesystem::default(),
            scheme: PartitionScheme::default(),
            verify_timeout_secs: default_verify_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from disk. Returns `Config::default()` if the file
    /// does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_default()
    }

    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save the current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Return the path to the config file.
    fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "webboot")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// The endpoint to dial: the command-line override if given, otherwise
    /// the configured one. Only `ws://` and `wss://` URLs are accepted.
    pub fn resolve_endpoint(&self, overridden: Option<&str>) -> Result<String> {
        let endpoint = overridden.unwrap_or(&self.endpoint).trim();
        if endpoint.is_empty() {
            bail!("Companion endpoint is empty");
        }
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            bail!(
                "Invalid companion endpoint '{}': expected a ws:// or wss:// URL",
                endpoint
            );
        }
        Ok(endpoint.to_string())
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs.max(1))
    }

    /// A job form preloaded with the configured defaults.
    pub fn job_form(&self) -> JobForm {
        JobForm::new(self.filesystem, self.scheme)
    }

    /// Adopt the form's filesystem and scheme as the new defaults. Returns
    /// whether anything changed.
    pub fn remember_form(&mut self, form: &JobForm) -> bool {
        let changed = self.filesystem != form.filesystem || self.scheme != form.scheme;
        self.filesystem = form.filesystem;
        self.scheme = form.scheme;
        changed
    }
}
