//! Bootstrap configuration loading and config file discovery
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. OS-dependent user config directory (`<config_dir>/truecheck/config.toml`)
//!
//! A missing config file is not an error: callers receive defaults and a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRUECHECK_CONFIG";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; the verify crate layers CLI and environment
/// values on top and falls back to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Flow mode: `multipart`, `direct` or `data-uri`
    #[serde(default)]
    pub mode: Option<String>,

    /// Base URL of the site hosting the analysis function
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds (0 disables the timeout)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Direct inference settings
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hugging Face inference settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HuggingFaceConfig {
    /// Model id, e.g. `umm-maybe/AI-image-detector`
    #[serde(default)]
    pub model: Option<String>,

    /// API token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Inference API base replacing the public Hugging Face host,
    /// e.g. a self-hosted endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
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

/// Resolve which config file to read
///
/// Returns `None` when neither an explicit path nor the default user config exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
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

    // Priority 3: OS-dependent user config
    default_config_path().filter(|p| p.exists())
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("truecheck").join("config.toml"))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load config with graceful degradation
///
/// A path that does not exist yields defaults plus a warning. A file that
/// exists but cannot be parsed is still an error.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    match path {
        None => {
            debug!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
        Some(path) if !path.exists() => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        Some(path) => {
            let config = load_toml_config(path)?;
            debug!("Loaded config from {}", path.display());
            Ok(config)
        }
    }
}
