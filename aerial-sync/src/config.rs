//! Configuration for the sync service
//!
//! Bootstrap settings come from a TOML file; credentials may also arrive
//! through environment variables so the binary can run without a config
//! file at all.
//!
//! Credential resolution priority:
//! 1. AERIAL_SERVER / AERIAL_USERNAME / AERIAL_PASSWORD environment variables
//! 2. TOML configuration file
//! 3. The stored account row from a previous session (binary fallback)

use std::path::{Path, PathBuf};

use serde::Deserialize;

use aerial_common::db::models::Credentials;
use aerial_common::{Error, Result};

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    /// Overrides the root-folder database location when set
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server: None,
            username: None,
            password: None,
            database_path: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SyncConfig {
    /// Load from `path`; an absent file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Resolve credentials; environment variables win over the file
    ///
    /// Returns `None` unless all three fields are available.
    pub fn credentials(&self) -> Option<Credentials> {
        let server = env_or("AERIAL_SERVER", &self.server)?;
        let username = env_or("AERIAL_USERNAME", &self.username)?;
        let password = env_or("AERIAL_PASSWORD", &self.password)?;

        Some(Credentials {
            username,
            password,
            server,
        })
    }
}

fn env_or(var: &str, fallback: &Option<String>) -> Option<String> {
    std::env::var(var).ok().or_else(|| fallback.clone())
}
