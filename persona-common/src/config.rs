//! Configuration file resolution and TOML loading
//!
//! Config file resolution follows a fixed priority order:
//! 1. Explicit path (command-line argument or caller-supplied)
//! 2. Environment variable
//! 3. Per-user config directory (`<config_dir>/persona/<file_name>`)
//! 4. None (caller falls back to compiled defaults)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve the configuration file to load, if any
///
/// Explicit paths and environment paths are returned even if they do not
/// exist, so that the subsequent load reports a clear error instead of
/// silently using defaults. The per-user location is only returned when the
/// file is present.
pub fn resolve_config_file(
    explicit: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Explicit path
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    dirs::config_dir()
        .map(|d| d.join("persona").join(file_name))
        .filter(|p| p.exists())
}

/// Load a TOML configuration file, or defaults when no path is given
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        tracing::debug!("No config file resolved, using compiled defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = parse_toml(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Parse TOML text into a configuration struct
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Read and parse an environment variable override
///
/// Unset variables yield `Ok(None)`; set but unparseable values are a
/// configuration error.
pub fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {}: {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
