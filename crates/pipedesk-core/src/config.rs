//! Application configuration management.
//!
//! Configuration is stored at `~/.config/pipedesk/config.json` and holds the
//! API base URL and the last used username. The base URL can also come from
//! the `PIPEDESK_API_URL` environment variable, which takes precedence over
//! the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "pipedesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API base URL, matching the server's development default.
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the API base URL
const API_URL_ENV: &str = "PIPEDESK_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve the API base URL: environment, then config file, then default.
    pub fn base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Directory holding persisted session state
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
