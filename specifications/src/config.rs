//! The compiler's JSON configuration file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// The recognized options in `config.json`. Missing keys fall back to their
/// defaults rather than failing, mirroring `original_source/src/config.py`'s
/// `Config.get`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource-identifier region field (e.g. `us-east-1`).
    pub region: String,
    /// Resource-identifier account field.
    pub account_id: String,
    /// When true, every helper-generated call is routed through a single
    /// dispatcher helper instead of getting its own Lambda resource.
    pub use_router_func: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { region: "us-east-1".into(), account_id: "set_account_id_in_config".into(), use_router_func: false }
    }
}

impl Config {
    /// Loads a config from `path`. A missing file is not an error: it
    /// produces the default config, just like `config.py`'s
    /// `except FileNotFoundError: pass`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ConfigError::Read { path: path.display().to_string(), err }),
        };
        serde_json::from_str(&raw).map_err(|err| ConfigError::Parse { path: path.display().to_string(), err })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {err}")]
    Read { path: String, err: std::io::Error },
    #[error("failed to parse config file '{path}' as JSON: {err}")]
    Parse { path: String, err: serde_json::Error },
}
