//! Configuration file resolution and loading
//!
//! Config file path priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`<config_dir>/lcd/<file_name>`)
//! 4. None: caller falls back to built-in defaults

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "LCD_CONFIG";

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "lcd.toml";

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

/// Resolve the config file path
///
/// Returns `None` when no candidate exists, in which case the caller uses
/// built-in defaults. An explicit CLI path is returned even if missing so the
/// subsequent load reports the error instead of silently falling back.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    let user_config = dirs::config_dir().map(|d| d.join("lcd").join(file_name))?;
    if user_config.exists() {
        return Some(user_config);
    }

    debug!("No config file found, using built-in defaults");
    None
}

/// Load and parse a TOML config file
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    debug!("Parsed configuration from {}", path.display());
    Ok(config)
}

/// A config value and the file it was read from
///
/// `path` is `None` when no file was found and `value` holds the defaults.
#[derive(Debug, Clone)]
pub struct LoadedConfig<T> {
    pub value: T,
    pub path: Option<PathBuf>,
}

/// Resolve and load a config file, falling back to `T::default()`
///
/// An unreadable or invalid file is an error; an absent file is not.
pub fn load_or_default<T: DeserializeOwned + Default>(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Result<LoadedConfig<T>> {
    let path = resolve_config_path(cli_arg, env_var_name, file_name);
    let value = match &path {
        Some(path) => load_toml_config(path)?,
        None => T::default(),
    };
    Ok(LoadedConfig { value, path })
}
