//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file; every field has a built-in
//! default so a missing file is never fatal.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `PERSONA_ROOT_FOLDER`
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::db::models::ContextData;
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "PERSONA_ROOT_FOLDER";
/// Environment variable naming the TOML config file
pub const ENV_CONFIG_FILE: &str = "PERSONA_CONFIG";
/// Environment variable supplying the AI service API key
pub const ENV_AI_API_KEY: &str = "PERSONA_AI_API_KEY";
/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "persona.db";

const APP_DIR_NAME: &str = "persona-booth";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    pub root_folder: Option<PathBuf>,
    /// Explicit database file, overriding `{root_folder}/persona.db`
    pub database_path: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub dashboard: DashboardConfig,
    pub ai_service: AiServiceConfig,
    pub safety: SafetyConfig,
    /// Static tags written into every event's `context_data`
    pub context: ContextConfig,
    pub logging: LoggingConfig,
}

/// Generation service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// Analytics dashboard settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    /// Staff password; absent or empty disables the gate
    pub password: Option<String>,
    /// Default lookback window in hours
    pub default_window_hours: u32,
    /// Default size of the recent-activity feed
    pub recent_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5741,
            password: None,
            default_window_hours: 24,
            recent_limit: 10,
        }
    }
}

/// Remote classification/generation service
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Completion model requested for both generation calls
    pub model: String,
    /// Per-call timeout; calls are never retried
    pub timeout_ms: u64,
    pub name_max_tokens: u32,
    pub capability_max_tokens: u32,
}

impl Default for AiServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8088".to_string(),
            api_key: None,
            model: "mixtral-8x7b".to_string(),
            timeout_ms: 10_000,
            name_max_tokens: 100,
            capability_max_tokens: 150,
        }
    }
}

/// Content policy settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Combined "name: capability" texts this short or shorter are rejected
    pub min_length: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self { min_length: 10 }
    }
}

/// Venue/event tags
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContextConfig(pub BTreeMap<String, String>);

impl Default for ContextConfig {
    fn default() -> Self {
        Self(
            [("booth", "accenture"), ("event", "snowflake_world_tour")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl ContextConfig {
    pub fn to_context_data(&self) -> ContextData {
        ContextData::from(self.0.clone())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load configuration, degrading to defaults
    ///
    /// Looks at `explicit`, then `PERSONA_CONFIG`, then the platform config
    /// locations. A missing or unreadable file logs a warning and yields the
    /// built-in defaults. Environment overrides are applied last.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match candidate {
            Some(path) => match Self::load(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using built-in defaults", e);
                    Self::default()
                }
            },
            None => {
                info!("No configuration file found; using built-in defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ENV_AI_API_KEY) {
            if !key.trim().is_empty() {
                self.ai_service.api_key = Some(key);
            }
        }
    }
}

/// First existing platform config file
///
/// `~/.config/persona-booth/config.toml`, then `/etc/persona-booth/config.toml`
/// on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./persona_data"))
}

/// Root folder resolution following the priority order in the module docs
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ENV_ROOT_FOLDER, path);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let path = default_root_folder();
        info!("[{}] Root folder (default): {}", self.module_name, path.display());
        path
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// Locate the database file for a service without touching the filesystem
///
/// A command-line root folder wins over `database_path`; otherwise an explicit
/// `database_path` wins over the resolved root folder.
pub fn locate_database_path(
    module_name: &str,
    cli_root: Option<PathBuf>,
    config: &TomlConfig,
) -> PathBuf {
    if cli_root.is_none() {
        if let Some(path) = &config.database_path {
            info!("[{}] Database path from config file: {}", module_name, path.display());
            return path.clone();
        }
    }

    let root_folder = RootFolderResolver::new(module_name)
        .with_cli_arg(cli_root)
        .with_toml(config)
        .resolve();
    RootFolderInitializer::new(root_folder).database_path()
}

/// Locate the database file and create its folder (writers only)
pub fn resolve_database_path(
    module_name: &str,
    cli_root: Option<PathBuf>,
    config: &TomlConfig,
) -> Result<PathBuf> {
    let path = locate_database_path(module_name, cli_root, config);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        RootFolderInitializer::new(parent.to_path_buf()).ensure_directory_exists()?;
    }
    Ok(path)
}
