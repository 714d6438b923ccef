//! Bootstrap configuration and root folder resolution
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file never stops startup. It is logged and
//! the compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config/data directories
pub const APP_DIR_NAME: &str = "event-concierge";

/// File name of the preference store inside the root folder
pub const DATABASE_FILE_NAME: &str = "event-concierge.db";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "EVC_ROOT_FOLDER";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_COMPOSIO_BASE_URL: &str = "https://backend.composio.dev/api/v3";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Bootstrap configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub composio: ComposioConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Tool-execution platform credentials. No API key means mock mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_composio_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ComposioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_composio_base_url(),
            user_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_composio_base_url() -> String {
    DEFAULT_COMPOSIO_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Values compiled into the binary, used when nothing else is configured
///
/// Only the root folder needs platform lookup; logging and server defaults
/// live on the `serde` defaults of [`TomlConfig`].
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!("./{}", APP_DIR_NAME)));

        Self { root_folder }
    }
}

/// Platform config file location (`<config_dir>/event-concierge/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load the config file if present, otherwise fall back to defaults
///
/// `explicit` is the `--config` path; without it the platform default path
/// is tried. Never fails.
pub fn load_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                return TomlConfig::default();
            }
        },
    };

    if !path.exists() {
        if explicit.is_some() {
            warn!("Config file {} not found, using compiled defaults", path.display());
        } else {
            debug!("No config file at {}, using compiled defaults", path.display());
        }
        return TomlConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder from CLI, environment, TOML and compiled defaults
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            toml_value: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                debug!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            debug!("Root folder from config file: {}", path.display());
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

impl Default for RootFolderResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents). Safe to call repeatedly.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
