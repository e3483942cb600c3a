//! Configuration loading and tiered resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal; it logs a warning and
//! resolution continues with the remaining tiers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default proxy port
pub const DEFAULT_PORT: u16 = 3001;

/// Default proxy bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the document store database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub proxy: ProxySection,

    #[serde(default)]
    pub credentials: CredentialsSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// `[proxy]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxySection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[credentials]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsSection {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub audd_api_token: Option<String>,
    pub openweather_api_key: Option<String>,
}

/// Validate a credential or setting (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one string setting across CLI → ENV → TOML
///
/// Blank values at any tier are skipped.
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg.filter(|v| is_valid_key(v)) {
        return Some(value.to_string());
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if is_valid_key(&value) {
            return Some(value);
        }
    }

    toml_value
        .filter(|v| is_valid_key(v))
        .map(|v| v.to_string())
}

/// Resolve the root folder across CLI → ENV → TOML → OS default
pub fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if is_valid_key(&path) {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("echo"))
        .unwrap_or_else(|| PathBuf::from("./echo_data"))
}

/// Locate the config file: user config first, then system-wide
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("echo").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/echo/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load config from an explicit path or the default location
///
/// Never fails: problems are logged and defaults returned.
pub fn load_config_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(config_file_path) {
        Some(path) => path,
        None => {
            info!("No config file found, using defaults");
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config: {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Write config as TOML, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
