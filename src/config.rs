//! Configuration: JSON file plus environment overrides.
//!
//! Lookup order for the file:
//! 1. WOLFIES_SMS_CONFIG env var
//! 2. ~/.wolfies-sms/config.json
//!
//! A missing file is not an error; every field has a default. `WOLFIES_SMS_DB`
//! overrides `db_path` after the file is read.
//!
//! CHANGELOG:
//! - 02/06/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db::connection::default_db_path;

pub const CONFIG_ENV: &str = "WOLFIES_SMS_CONFIG";
pub const DB_ENV: &str = "WOLFIES_SMS_DB";

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wolfies-sms")
}

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    base_dir().join("config.json")
}

/// Default daemon socket path.
pub fn default_socket_path() -> PathBuf {
    base_dir().join("daemon.sock")
}

/// Expand a leading `~` in a path.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file backing `content://sms`.
    pub db_path: PathBuf,
    /// UNIX socket the daemon listens on.
    pub socket_path: PathBuf,
    /// Answer permission requests with a grant (daemon has no interactive prompt).
    pub grant_permissions: bool,
    /// Whether a foreground activity exists to host the prompt.
    pub foreground_activity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            socket_path: default_socket_path(),
            grant_permissions: false,
            foreground_activity: true,
        }
    }
}

impl Config {
    /// Load from a file. Missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            tracing::debug!(?path, "no config file, using defaults");
            Config::default()
        };

        Ok(config
            .with_db_override(std::env::var(DB_ENV).ok())
            .expanded())
    }

    /// Load from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    fn with_db_override(mut self, db: Option<String>) -> Self {
        if let Some(db) = db.filter(|d| !d.trim().is_empty()) {
            self.db_path = PathBuf::from(db);
        }
        self
    }

    fn expanded(mut self) -> Self {
        self.db_path = expand_path(&self.db_path);
        self.socket_path = expand_path(&self.socket_path);
        self
    }
}
