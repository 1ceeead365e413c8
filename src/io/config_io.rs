use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::TrackerConfig;

pub const CONFIG_FILE: &str = "questlog.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read `questlog.toml` from the tracker directory. A missing file yields
/// the built-in defaults; a malformed file is an error.
pub fn read_config(dir: &Path) -> Result<TrackerConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(TrackerConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })
}
