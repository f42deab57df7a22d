//! Bootstrap configuration loading
//!
//! Configuration file resolution, highest priority first:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`RAIDPROG_CONFIG`)
//! 3. Platform config directory (`<config dir>/raidprog/config.toml`)
//! 4. Built-in defaults
//!
//! A missing configuration file is not an error: defaults are used and a
//! warning is logged. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "RAIDPROG_CONFIG";

/// Environment variable holding the FFLogs API key
pub const API_KEY_ENV: &str = "RAIDPROG_FFLOGS_API_KEY";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while the service is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// FFLogs v1 API key (environment variable takes precedence)
    #[serde(default)]
    pub fflogs_api_key: Option<String>,

    /// FFLogs v1 API base URL
    #[serde(default = "default_fflogs_base_url")]
    pub fflogs_base_url: String,

    /// Upper bound on a single report fetch
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Import queue worker tick interval
    #[serde(default = "default_queue_tick_ms")]
    pub queue_tick_ms: u64,

    /// Minimum seconds between two import requests from the same client
    #[serde(default = "default_import_rate_limit_secs")]
    pub import_rate_limit_secs: u64,

    /// Encounter groupings shown on character pages
    #[serde(default)]
    pub displayed_encounters: Vec<DisplayCategory>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
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

/// Named group of encounters, matched by boss id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCategory {
    pub name: String,
    #[serde(default)]
    pub boss_ids: Vec<i64>,
}

fn default_database_path() -> PathBuf {
    default_data_dir().join("raidprog.db")
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_fflogs_base_url() -> String {
    "https://www.fflogs.com/v1".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_queue_tick_ms() -> u64 {
    1000
}

fn default_import_rate_limit_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OS-dependent data directory for the default database location
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("raidprog"))
        .unwrap_or_else(|| PathBuf::from("./raidprog_data"))
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            port: default_port(),
            fflogs_api_key: None,
            fflogs_base_url: default_fflogs_base_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            queue_tick_ms: default_queue_tick_ms(),
            import_rate_limit_secs: default_import_rate_limit_secs(),
            logging: LoggingConfig::default(),
            displayed_encounters: Vec::new(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration file and load it, falling back to defaults
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                // An explicitly named file must exist
                if cli_path.is_some() || std::env::var_os(CONFIG_PATH_ENV).is_some() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                warn!(
                    "No config file at {}, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Resolve the FFLogs API key
    ///
    /// **Priority:** environment → TOML. Blank values are ignored.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if is_valid_key(&key) {
                info!("FFLogs API key loaded from environment variable");
                return Ok(key);
            }
        }

        if let Some(key) = &self.fflogs_api_key {
            if is_valid_key(key) {
                info!("FFLogs API key loaded from TOML config");
                return Ok(key.clone());
            }
        }

        Err(Error::Config(format!(
            "FFLogs API key not configured. Set {} or fflogs_api_key in the config file",
            API_KEY_ENV
        )))
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Determine which configuration file to read
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|d| d.join("raidprog").join("config.toml"))
}

/// Write configuration to a TOML file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
