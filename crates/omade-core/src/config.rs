//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! identity provider base URL, request timeout, where the session envelope is
//! persisted, and the route guard policy knobs.
//!
//! Configuration is stored at `~/.config/omade-cravings/config.json`.
//! `OMADE_API_BASE_URL` and `OMADE_REQUEST_TIMEOUT_MS` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "omade-cravings";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Storage key holding the persisted session envelope
pub const DEFAULT_STORAGE_KEY: &str = "auth-store";

/// Role that passes every permission check
pub const DEFAULT_ELEVATED_ROLE: &str = "super_admin";

pub const DEFAULT_SITE_URL: &str = "https://omadecravings.com";

const ENV_API_BASE_URL: &str = "OMADE_API_BASE_URL";
const ENV_REQUEST_TIMEOUT_MS: &str = "OMADE_REQUEST_TIMEOUT_MS";

/// Durable storage backend for the session envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON file per key under the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only; nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub storage: StorageKind,
    pub storage_key: String,
    pub elevated_role: String,
    /// Landing route for authenticated users hitting the login area.
    /// `None` lets them through.
    pub redirect_authenticated_to: Option<String>,
    pub site_url: String,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            storage: StorageKind::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            elevated_role: DEFAULT_ELEVATED_ROLE.to_string(),
            redirect_authenticated_to: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// The config file alone, without environment overrides
    pub fn load_file() -> Result<Self> {
        Self::read_from(&Self::config_path()?)
    }

    /// Write the config file. Callers holding a config from `load` should
    /// prefer `remember_email`, which keeps overrides out of the file.
    pub fn save(&self) -> Result<()> {
        self.write_to(&Self::config_path()?)
    }

    /// Record the last login email in the config file, leaving every other
    /// persisted setting as the file has it
    pub fn remember_email(email: &str) -> Result<()> {
        Self::remember_email_at(&Self::config_path()?, email)
    }

    fn remember_email_at(path: &Path, email: &str) -> Result<()> {
        let mut stored = Self::read_from(path)?;
        stored.last_email = Some(email.to_string());
        stored.write_to(path)
    }

    fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse config file")
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_BASE_URL).ok(),
            std::env::var(ENV_REQUEST_TIMEOUT_MS).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, timeout_ms: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(raw) = timeout_ms {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.request_timeout_ms = ms,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_REQUEST_TIMEOUT_MS),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for file-backed session storage
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
