use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// Credential baked into the binary as the last fallback
///
/// The upstream rejects it; real deployments set `COZE_API_KEY` or put
/// `api_key` in the config file.
pub const DEFAULT_API_KEY: &str = "pat_0000000000000000000000000000000000000000";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub bot_id: Option<String>,
    pub api_base: Option<String>,
    pub default_format: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.config/dcx/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Resolve the API credential: `COZE_API_KEY` env var, then the config
    /// file, then the baked-in placeholder
    pub fn resolve_api_key(&self) -> String {
        resolve_api_key_from(std::env::var("COZE_API_KEY").ok(), self)
    }
}

fn resolve_api_key_from(env_key: Option<String>, config: &Config) -> String {
    env_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| config.api_key.clone())
        .unwrap_or_else(|| DEFAULT_API_KEY.to_string())
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("dcx")
        .join("config.toml")
}
